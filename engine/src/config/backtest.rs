// Typed parameters for a single backtest run.
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use shared::models::TimeFrame;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Exchange pair, e.g. `BTC/USDT`.
    pub symbol: String,
    pub timeframe: TimeFrame,
    /// Bars to look ahead for win-rate scoring and for the time exit.
    pub horizon: usize,
    /// Number of bars kept for the backtest after indicator warm-up.
    pub limit: usize,
    /// Fractions of the entry price; 0 disables the exit.
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
    pub use_trend_filter: bool,
    /// 0 disables the ADX filter.
    pub adx_threshold: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            symbol: "BTC/USDT".to_string(),
            timeframe: TimeFrame::Hour1,
            horizon: 3,
            limit: 1000,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            trailing_stop_pct: 0.0,
            use_trend_filter: false,
            adx_threshold: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::ConfigError("symbol must not be empty".to_string()));
        }
        if self.horizon == 0 {
            return Err(EngineError::ConfigError("horizon must be at least 1 bar".to_string()));
        }
        if self.limit == 0 {
            return Err(EngineError::ConfigError("limit must be at least 1 candle".to_string()));
        }
        for (name, value) in [
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
            ("trailing_stop_pct", self.trailing_stop_pct),
        ] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(EngineError::ConfigError(format!(
                    "{} must be a fraction in [0, 1), got {}",
                    name, value
                )));
            }
        }
        if !self.adx_threshold.is_finite() || !(0.0..=100.0).contains(&self.adx_threshold) {
            return Err(EngineError::ConfigError(format!(
                "adx_threshold must be in [0, 100], got {}",
                self.adx_threshold
            )));
        }
        Ok(())
    }
}
