// Data models shared between the backtest engine and any presentation layer.
pub mod models;
