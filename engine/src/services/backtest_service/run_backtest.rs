// Handler for a single backtest run: fetch, annotate, signal, evaluate
use std::sync::Arc;

use chrono::Utc;
use shared::models::{AnnotatedBar, BacktestReport};
use uuid::Uuid;

use super::evaluate_indicators::handle_evaluate_indicators;
use super::BacktestOutcome;
use crate::backtest::SimulationParams;
use crate::config::{BacktestConfig, SimulationSettings};
use crate::data::MarketDataFetcher;
use crate::error::Result;
use crate::indicators::IndicatorSuite;
use crate::signals::{self, SignalFilters};

pub async fn handle_run_backtest(
    config: &BacktestConfig,
    fetcher: &MarketDataFetcher,
    indicators: &IndicatorSuite,
    warmup_bars: usize,
    simulation: &SimulationSettings,
) -> Result<BacktestOutcome> {
    config.validate()?;
    simulation.validate()?;

    let requested = config.limit.saturating_add(warmup_bars);
    let candles = fetcher.fetch(&config.symbol, config.timeframe, requested).await;
    if candles.is_empty() {
        tracing::warn!(
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            "No market data available, backtest skipped"
        );
        return Ok(BacktestOutcome::NoData {
            symbol: config.symbol.clone(),
            timeframe: config.timeframe,
        });
    }

    // Indicators see the full padded history; only the most recent `limit` bars are scored.
    let mut annotated = indicators.compute(&candles);
    let keep_from = annotated.len().saturating_sub(config.limit);
    let mut series = annotated.split_off(keep_from);
    tracing::debug!(
        fetched = candles.len(),
        warmup_dropped = keep_from,
        kept = series.len(),
        "Trimmed warm-up bars"
    );

    let filters = SignalFilters {
        use_trend_filter: config.use_trend_filter,
        adx_threshold: config.adx_threshold,
    };
    signals::generate(&mut series, &filters);

    let series: Arc<[AnnotatedBar]> = series.into();
    let params = SimulationParams::new(config, simulation);
    let results = handle_evaluate_indicators(Arc::clone(&series), params).await?;

    let report = BacktestReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        symbol: config.symbol.clone(),
        timeframe: config.timeframe,
        horizon: config.horizon,
        limit: config.limit,
        stop_loss_pct: config.stop_loss_pct,
        take_profit_pct: config.take_profit_pct,
        trailing_stop_pct: config.trailing_stop_pct,
        fee_rate: simulation.fee_rate,
        initial_capital: simulation.initial_capital,
        use_trend_filter: config.use_trend_filter,
        adx_threshold: config.adx_threshold,
        data_points: series.len(),
        indicator_parameters: indicators.parameters(),
        results,
        series: series.to_vec(),
    };
    tracing::info!(
        run_id = %report.run_id,
        symbol = %report.symbol,
        data_points = report.data_points,
        "Backtest completed"
    );
    Ok(BacktestOutcome::Completed(Box::new(report)))
}
