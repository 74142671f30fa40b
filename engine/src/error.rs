use shared::models::TimeFrame;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("HTTP request error: {source}")]
    HttpError {
        #[from]
        source: reqwest::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("URL error: {source}")]
    UrlError {
        #[from]
        source: url::ParseError,
    },

    #[error("Market data error: {0}")]
    MarketDataError(String),

    #[error("Timeframe {timeframe} is not supported by source '{source_name}'")]
    UnsupportedTimeframe {
        source_name: String,
        timeframe: TimeFrame,
    },

    #[error("Trade simulation error: {0}")]
    SimulationError(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
