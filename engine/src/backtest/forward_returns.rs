// Direction-only scoring of signals against the close `horizon` bars later
use shared::models::{AnnotatedBar, Signal, SignalIndicator, WinRateStats};

use super::metrics::rate_pct;

/// Scores every signal of `indicator`.
///
/// Rates are taken over every signal. One without a bar `horizon` steps ahead
/// counts as a miss; `evaluated_*` record how many could be scored.
pub fn evaluate(bars: &[AnnotatedBar], indicator: SignalIndicator, horizon: usize) -> WinRateStats {
    let mut stats = WinRateStats::default();

    for (t, bar) in bars.iter().enumerate() {
        let signal = bar.signals.get(indicator);
        match signal {
            Signal::Long => stats.buy_signals += 1,
            Signal::Short => stats.sell_signals += 1,
            Signal::Flat => continue,
        }

        let Some(future) = t.checked_add(horizon).and_then(|end| bars.get(end)) else {
            continue;
        };
        let future_return = future.candle.close - bar.candle.close;

        match signal {
            Signal::Long => {
                stats.evaluated_buy_signals += 1;
                if future_return > 0.0 {
                    stats.buy_wins += 1;
                }
            }
            Signal::Short => {
                stats.evaluated_sell_signals += 1;
                if future_return < 0.0 {
                    stats.sell_wins += 1;
                }
            }
            Signal::Flat => {}
        }
    }

    stats.total_signals = stats.buy_signals + stats.sell_signals;
    stats.buy_win_rate = rate_pct(stats.buy_wins, stats.buy_signals);
    stats.sell_win_rate = rate_pct(stats.sell_wins, stats.sell_signals);
    stats.win_rate = rate_pct(stats.buy_wins + stats.sell_wins, stats.total_signals);
    stats
}
