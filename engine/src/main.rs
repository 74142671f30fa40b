// Engine main entry point: runs one backtest and prints the report as JSON
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use engine::backtest::simulator::exit_breakdown;
use engine::config::EngineSettings;
use engine::data::MarketDataFetcher;
use engine::services::{BacktestOutcome, BacktestService};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting backtest engine...");

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = EngineSettings::load(config_path.as_deref()).context("failed to load engine settings")?;

    let fetcher = MarketDataFetcher::from_settings(&settings.data).context("failed to build market data sources")?;
    let service = BacktestService::new(Arc::new(fetcher), &settings);

    match service.run_backtest(&settings.backtest).await? {
        BacktestOutcome::Completed(report) => {
            for (indicator, result) in &report.results {
                let exits = exit_breakdown(&result.pnl)
                    .iter()
                    .map(|(reason, n)| format!("{:?}={}", reason, n))
                    .collect::<Vec<_>>()
                    .join(" ");
                info!(
                    indicator = %indicator,
                    win_rate = %format!("{:.1}%", result.win_rates.win_rate),
                    total_return = %format!("{:.2}%", result.pnl.total_return_pct),
                    max_drawdown = %format!("{:.2}%", result.pnl.max_drawdown_pct),
                    exits = %exits,
                    "Summary"
                );
            }
            let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            println!("{}", json);
        }
        BacktestOutcome::NoData { symbol, timeframe } => {
            warn!(symbol = %symbol, timeframe = %timeframe, "No market data from any source, nothing to report");
        }
    }

    Ok(())
}
