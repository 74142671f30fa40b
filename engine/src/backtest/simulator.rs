// Single-position replay of one indicator's signals
use shared::models::{AnnotatedBar, ExitReason, PnlStats, SignalIndicator, TradeDirection, TradeRecord};
use tracing::debug;

use super::metrics::{max_drawdown_pct, total_return_pct};
use crate::config::{BacktestConfig, SimulationSettings};
use crate::models::{ExitRules, Position};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub horizon: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
    /// Charged on both legs of every trade.
    pub fee_rate: f64,
    pub initial_capital: f64,
}

impl SimulationParams {
    pub fn new(config: &BacktestConfig, settings: &SimulationSettings) -> Self {
        Self {
            horizon: config.horizon,
            stop_loss_pct: config.stop_loss_pct,
            take_profit_pct: config.take_profit_pct,
            trailing_stop_pct: config.trailing_stop_pct,
            fee_rate: settings.fee_rate,
            initial_capital: settings.initial_capital,
        }
    }

    fn exit_rules(&self) -> ExitRules {
        ExitRules {
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            trailing_stop_pct: self.trailing_stop_pct,
            horizon: self.horizon,
        }
    }
}

/// Replays `indicator`'s signals over `bars` and returns the equity curve with its metrics.
///
/// Exits are checked before entries on every bar, so a position closed on bar `t`
/// can be replaced by a new one at the close of `t`. Entries need `horizon` bars
/// of room before the end of the series.
pub fn simulate(bars: &[AnnotatedBar], indicator: SignalIndicator, params: &SimulationParams) -> PnlStats {
    let rules = params.exit_rules();
    let fee_multiplier = (1.0 - params.fee_rate).powi(2);

    let mut capital = params.initial_capital;
    let mut position: Option<Position> = None;
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut exit_reasons = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        let candle = &bar.candle;
        let mut exit_reason = None;

        if let Some(mut pos) = position.take() {
            pos.update_anchor(candle);
            match pos.check_exit(i, candle, &rules) {
                Some((reason, exit_price)) => {
                    let gross_return = pos.gross_return(exit_price);
                    capital *= (1.0 + gross_return) * fee_multiplier;
                    debug!(
                        indicator = %indicator,
                        entry_index = pos.entry_index,
                        exit_index = i,
                        ?reason,
                        gross_return,
                        capital,
                        "Position closed"
                    );
                    trades.push(TradeRecord {
                        direction: pos.direction,
                        entry_index: pos.entry_index,
                        exit_index: i,
                        entry_time: bars[pos.entry_index].candle.timestamp,
                        exit_time: candle.timestamp,
                        entry_price: pos.entry_price,
                        exit_price,
                        reason,
                        gross_return,
                        capital_after: capital,
                    });
                    exit_reason = Some(reason);
                }
                None => position = Some(pos),
            }
        }

        let has_room = i.checked_add(params.horizon).is_some_and(|end| end < bars.len());
        if position.is_none() && has_room && candle.close > 0.0 {
            if let Some(direction) = TradeDirection::from_signal(bar.signals.get(indicator)) {
                position = Some(Position::open(direction, i, candle));
            }
        }

        equity_curve.push(capital);
        exit_reasons.push(exit_reason);
    }

    let final_capital = equity_curve.last().copied().unwrap_or(params.initial_capital);
    PnlStats {
        initial_capital: params.initial_capital,
        final_capital,
        total_return_pct: total_return_pct(final_capital, params.initial_capital),
        max_drawdown_pct: max_drawdown_pct(&equity_curve),
        trade_count: trades.len(),
        open_position_at_end: position.is_some(),
        equity_curve,
        exit_reasons,
        trades,
    }
}

/// Count of closed trades per exit reason.
pub fn exit_breakdown(stats: &PnlStats) -> [(ExitReason, usize); 4] {
    let count = |reason: ExitReason| stats.trades.iter().filter(|t| t.reason == reason).count();
    [
        (ExitReason::StopLoss, count(ExitReason::StopLoss)),
        (ExitReason::TrailingStop, count(ExitReason::TrailingStop)),
        (ExitReason::TakeProfit, count(ExitReason::TakeProfit)),
        (ExitReason::Time, count(ExitReason::Time)),
    ]
}
