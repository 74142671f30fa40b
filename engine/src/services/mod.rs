// Application services exposed by the engine
pub mod backtest_service;

pub use backtest_service::{BacktestOutcome, BacktestService};
