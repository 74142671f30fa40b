// engine/src/services/backtest_service/mod.rs
// BacktestService wires the fetcher, indicator suite and simulator together.
// Each step lives in its own handler module.
use std::sync::Arc;

use shared::models::{BacktestReport, TimeFrame};

use crate::config::{BacktestConfig, EngineSettings, SimulationSettings};
use crate::data::MarketDataFetcher;
use crate::error::Result;
use crate::indicators::IndicatorSuite;

pub mod evaluate_indicators;
pub mod run_backtest;

/// Result of a run. Missing market data is an outcome, not an error.
#[derive(Debug, Clone)]
pub enum BacktestOutcome {
    Completed(Box<BacktestReport>),
    NoData { symbol: String, timeframe: TimeFrame },
}

pub struct BacktestService {
    fetcher: Arc<MarketDataFetcher>,
    indicators: Arc<IndicatorSuite>,
    warmup_bars: usize,
    simulation: SimulationSettings,
}

impl BacktestService {
    pub fn new(fetcher: Arc<MarketDataFetcher>, settings: &EngineSettings) -> Self {
        BacktestService {
            fetcher,
            indicators: Arc::new(IndicatorSuite::default()),
            warmup_bars: settings.data.warmup_bars,
            simulation: settings.simulation.clone(),
        }
    }

    pub async fn run_backtest(&self, config: &BacktestConfig) -> Result<BacktestOutcome> {
        tracing::info!(
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            horizon = config.horizon,
            limit = config.limit,
            "Received backtest request, dispatching to handler."
        );
        run_backtest::handle_run_backtest(
            config,
            &self.fetcher,
            &self.indicators,
            self.warmup_bars,
            &self.simulation,
        )
        .await
    }
}
