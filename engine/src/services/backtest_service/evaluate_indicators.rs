// Fans the per-indicator evaluation and simulation out over blocking tasks
use std::collections::BTreeMap;
use std::sync::Arc;

use shared::models::{AnnotatedBar, IndicatorReport, SignalIndicator};
use tokio::task::JoinSet;

use crate::backtest::{evaluate, simulate, SimulationParams};
use crate::error::{EngineError, Result};

pub async fn handle_evaluate_indicators(
    series: Arc<[AnnotatedBar]>,
    params: SimulationParams,
) -> Result<BTreeMap<SignalIndicator, IndicatorReport>> {
    let mut tasks = JoinSet::new();
    for indicator in SignalIndicator::ALL {
        let series = Arc::clone(&series);
        tasks.spawn_blocking(move || {
            let win_rates = evaluate(&series, indicator, params.horizon);
            let pnl = simulate(&series, indicator, &params);
            (indicator, IndicatorReport { win_rates, pnl })
        });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (indicator, report) =
            joined.map_err(|e| EngineError::SimulationError(format!("indicator task failed: {}", e)))?;
        tracing::info!(
            indicator = %indicator,
            signals = report.win_rates.total_signals,
            win_rate = report.win_rates.win_rate,
            trades = report.pnl.trade_count,
            total_return_pct = report.pnl.total_return_pct,
            max_drawdown_pct = report.pnl.max_drawdown_pct,
            "Indicator evaluated"
        );
        results.insert(indicator, report);
    }
    Ok(results)
}
