// Market data acquisition: remote sources, the offline CSV source and the fetcher that ties them together.
pub mod binance;
pub mod csv_parser;
pub mod market_data;
pub mod source;
pub mod yahoo;

pub use market_data::{normalize_series, MarketDataFetcher};
pub use source::{CandleSource, PageSource, Paginated};
