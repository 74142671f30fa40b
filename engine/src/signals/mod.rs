// Signal generation: indicator series -> per-bar directional calls
use shared::models::{AnnotatedBar, IndicatorValues, Signal, SignalIndicator};
use tracing::debug;

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const STOCH_OVERSOLD: f64 = 20.0;
const STOCH_OVERBOUGHT: f64 = 80.0;
const WILLR_OVERSOLD: f64 = -80.0;
const WILLR_OVERBOUGHT: f64 = -20.0;

/// Optional masks applied after the raw rules.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalFilters {
    /// Drop longs below the trend EMA and shorts above it.
    pub use_trend_filter: bool,
    /// Drop any signal on a bar whose ADX is below this level. 0 disables.
    pub adx_threshold: f64,
}

type LinePair = (Option<f64>, Option<f64>);

/// `v` crosses above `x` at bar `t`. Undefined operands never cross.
fn crosses_above(prev: LinePair, cur: LinePair) -> bool {
    match (prev, cur) {
        ((Some(pv), Some(px)), (Some(v), Some(x))) => v > x && pv <= px,
        _ => false,
    }
}

fn crosses_below(prev: LinePair, cur: LinePair) -> bool {
    match (prev, cur) {
        ((Some(pv), Some(px)), (Some(v), Some(x))) => v < x && pv >= px,
        _ => false,
    }
}

/// (crossed above, crossed below) for the pair of lines picked out by `lines`.
fn crossings(
    prev: Option<&IndicatorValues>,
    cur: &IndicatorValues,
    lines: impl Fn(&IndicatorValues) -> LinePair,
) -> (bool, bool) {
    match prev {
        Some(prev) => {
            let (p, c) = (lines(prev), lines(cur));
            (crosses_above(p, c), crosses_below(p, c))
        }
        None => (false, false),
    }
}

fn signal_from(long: bool, short: bool) -> Signal {
    if long {
        Signal::Long
    } else if short {
        Signal::Short
    } else {
        Signal::Flat
    }
}

fn raw_signal(indicator: SignalIndicator, prev: Option<&IndicatorValues>, cur: &IndicatorValues) -> Signal {
    match indicator {
        SignalIndicator::Rsi => match cur.rsi {
            Some(rsi) if rsi < RSI_OVERSOLD => Signal::Long,
            Some(rsi) if rsi > RSI_OVERBOUGHT => Signal::Short,
            _ => Signal::Flat,
        },
        SignalIndicator::Macd => {
            let (up, down) = crossings(prev, cur, |v| (v.macd, v.macd_signal));
            signal_from(up, down)
        }
        SignalIndicator::Roc => {
            let (up, down) = crossings(prev, cur, |v| (v.roc, Some(0.0)));
            signal_from(up, down)
        }
        SignalIndicator::Stoch => {
            let (up, down) = crossings(prev, cur, |v| (v.stoch_k, v.stoch_d));
            signal_from(
                up && cur.stoch_k.is_some_and(|k| k < STOCH_OVERSOLD),
                down && cur.stoch_k.is_some_and(|k| k > STOCH_OVERBOUGHT),
            )
        }
        SignalIndicator::WillR => {
            let (up, _) = crossings(prev, cur, |v| (v.willr_smoothed, Some(WILLR_OVERSOLD)));
            let (_, down) = crossings(prev, cur, |v| (v.willr_smoothed, Some(WILLR_OVERBOUGHT)));
            signal_from(up, down)
        }
    }
}

/// Whether the filters let `signal` through on `bar`.
///
/// An undefined trend EMA or ADX never suppresses anything.
fn passes_filters(bar: &AnnotatedBar, signal: Signal, filters: &SignalFilters) -> bool {
    if filters.use_trend_filter {
        if let Some(trend) = bar.indicators.ema_trend {
            let close = bar.candle.close;
            match signal {
                Signal::Long if close < trend => return false,
                Signal::Short if close > trend => return false,
                _ => {}
            }
        }
    }
    if filters.adx_threshold > 0.0 {
        if let Some(adx) = bar.indicators.adx {
            if adx < filters.adx_threshold {
                return false;
            }
        }
    }
    true
}

/// Rewrites every bar's signal set from its indicator values.
///
/// Signals are recomputed from scratch, so calling this twice gives the same result.
pub fn generate(bars: &mut [AnnotatedBar], filters: &SignalFilters) {
    let mut prev: Option<IndicatorValues> = None;
    let mut suppressed = 0usize;

    for bar in bars.iter_mut() {
        let cur = bar.indicators;
        for indicator in SignalIndicator::ALL {
            let raw = raw_signal(indicator, prev.as_ref(), &cur);
            let signal = if raw.is_active() && !passes_filters(bar, raw, filters) {
                suppressed += 1;
                Signal::Flat
            } else {
                raw
            };
            bar.signals.set(indicator, signal);
        }
        prev = Some(cur);
    }

    debug!(
        bars = bars.len(),
        suppressed,
        trend_filter = filters.use_trend_filter,
        adx_threshold = filters.adx_threshold,
        "Signals generated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::test_support::hourly_candles;
    use crate::indicators::IndicatorSuite;
    use chrono::{Duration, TimeZone, Utc};
    use shared::models::Candle;

    fn flat_bars(len: usize, close: f64) -> Vec<AnnotatedBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                AnnotatedBar::from(Candle {
                    timestamp: start + Duration::hours(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1.0,
                })
            })
            .collect()
    }

    fn signals_of(bars: &[AnnotatedBar], indicator: SignalIndicator) -> Vec<Signal> {
        bars.iter().map(|b| b.signals.get(indicator)).collect()
    }

    #[test]
    fn test_macd_golden_cross_at_bar_50() {
        let mut bars = flat_bars(60, 100.0);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.indicators.macd = Some(if i < 50 { -1.0 } else { 1.0 });
            bar.indicators.macd_signal = Some(0.0);
        }
        generate(&mut bars, &SignalFilters::default());

        let macd = signals_of(&bars, SignalIndicator::Macd);
        assert_eq!(macd[50], Signal::Long);
        assert_eq!(macd.iter().filter(|s| s.is_active()).count(), 1);
    }

    #[test]
    fn test_macd_death_cross_and_touch() {
        let mut bars = flat_bars(4, 100.0);
        let lines = [(1.0, 0.0), (0.0, 0.0), (-1.0, 0.0), (0.5, 0.0)];
        for (bar, (m, s)) in bars.iter_mut().zip(lines) {
            bar.indicators.macd = Some(m);
            bar.indicators.macd_signal = Some(s);
        }
        generate(&mut bars, &SignalFilters::default());
        // Touching the line at bar 1 is not a cross; bar 2 crosses from equal.
        assert_eq!(
            signals_of(&bars, SignalIndicator::Macd),
            vec![Signal::Flat, Signal::Flat, Signal::Short, Signal::Long]
        );
    }

    #[test]
    fn test_rsi_oversold_is_level_triggered() {
        let mut bars = flat_bars(40, 100.0);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.indicators.rsi = Some(if (30..35).contains(&i) { 25.0 } else { 50.0 });
        }
        generate(&mut bars, &SignalFilters::default());

        let rsi = signals_of(&bars, SignalIndicator::Rsi);
        for (i, signal) in rsi.iter().enumerate() {
            let expected = if (30..35).contains(&i) { Signal::Long } else { Signal::Flat };
            assert_eq!(*signal, expected, "bar {}", i);
        }
    }

    #[test]
    fn test_price_jump_drives_macd_cross_at_bar_50() {
        let closes: Vec<f64> = (0..60).map(|i| if i < 50 { 100.0 } else { 110.0 }).collect();
        let mut bars = IndicatorSuite::default().compute(&hourly_candles(&closes));
        generate(&mut bars, &SignalFilters::default());

        // Flat prices keep MACD on its signal line until the jump.
        assert_eq!(bars[49].indicators.macd_hist, Some(0.0));
        assert!(bars[50].indicators.macd_hist.unwrap() > 0.0);
        let macd = signals_of(&bars, SignalIndicator::Macd);
        assert!(macd[..50].iter().all(|s| *s == Signal::Flat));
        assert_eq!(macd[50], Signal::Long);
    }

    #[test]
    fn test_selloff_drives_rsi_oversold_on_bars_30_to_34() {
        let mut closes = vec![200.0];
        for i in 1..60 {
            let change = match i {
                30 => -15.0,
                31..=34 => -2.0,
                35 => 20.0,
                _ if i % 2 == 1 => 1.0,
                _ => -1.0,
            };
            closes.push(closes[i - 1] + change);
        }
        let mut bars = IndicatorSuite::default().compute(&hourly_candles(&closes));
        generate(&mut bars, &SignalFilters::default());

        let longs: Vec<usize> = signals_of(&bars, SignalIndicator::Rsi)
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Signal::Long)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(longs, vec![30, 31, 32, 33, 34]);
        assert!(bars[35].indicators.rsi.unwrap() > 50.0);
    }

    #[test]
    fn test_undefined_operands_never_signal() {
        let mut bars = flat_bars(3, 100.0);
        bars[1].indicators.roc = Some(-1.0);
        bars[2].indicators.roc = Some(1.0);
        bars[1].indicators.macd = Some(-1.0);
        bars[2].indicators.macd = Some(1.0);
        bars[2].indicators.macd_signal = Some(0.0);
        generate(&mut bars, &SignalFilters::default());

        assert_eq!(bars[2].signals.roc, Signal::Long);
        assert_eq!(bars[2].signals.macd, Signal::Flat);
        assert!(bars.iter().all(|b| b.signals.rsi == Signal::Flat));
    }

    #[test]
    fn test_stochastic_requires_zone() {
        let mut bars = flat_bars(4, 100.0);
        let lines = [(10.0, 12.0), (15.0, 12.0), (85.0, 88.0), (90.0, 88.0)];
        for (bar, (k, d)) in bars.iter_mut().zip(lines) {
            bar.indicators.stoch_k = Some(k);
            bar.indicators.stoch_d = Some(d);
        }
        generate(&mut bars, &SignalFilters::default());
        // Bar 3 crosses up again but outside the oversold zone.
        assert_eq!(
            signals_of(&bars, SignalIndicator::Stoch),
            vec![Signal::Flat, Signal::Long, Signal::Short, Signal::Flat]
        );

        bars[2].indicators.stoch_k = Some(92.0);
        bars[3].indicators.stoch_k = Some(85.0);
        generate(&mut bars, &SignalFilters::default());
        assert_eq!(bars[3].signals.stoch, Signal::Short);
    }

    #[test]
    fn test_williams_r_uses_smoothed_line() {
        let mut bars = flat_bars(4, 100.0);
        let smoothed = [-85.0, -75.0, -15.0, -25.0];
        for (bar, w) in bars.iter_mut().zip(smoothed) {
            bar.indicators.willr_smoothed = Some(w);
            bar.indicators.willr = Some(-50.0);
        }
        generate(&mut bars, &SignalFilters::default());
        assert_eq!(
            signals_of(&bars, SignalIndicator::WillR),
            vec![Signal::Flat, Signal::Long, Signal::Flat, Signal::Short]
        );
    }

    #[test]
    fn test_trend_filter_masks_countertrend_signals() {
        let mut bars = flat_bars(3, 100.0);
        bars[0].indicators.rsi = Some(20.0);
        bars[0].indicators.ema_trend = Some(110.0);
        bars[1].indicators.rsi = Some(80.0);
        bars[1].indicators.ema_trend = Some(90.0);
        bars[2].indicators.rsi = Some(20.0);

        let filters = SignalFilters { use_trend_filter: true, adx_threshold: 0.0 };
        generate(&mut bars, &filters);
        assert_eq!(bars[0].signals.rsi, Signal::Flat);
        assert_eq!(bars[1].signals.rsi, Signal::Flat);
        // No trend value yet: not suppressed
        assert_eq!(bars[2].signals.rsi, Signal::Long);

        bars[0].indicators.ema_trend = Some(90.0);
        generate(&mut bars, &filters);
        assert_eq!(bars[0].signals.rsi, Signal::Long);
    }

    #[test]
    fn test_adx_filter_masks_weak_trends() {
        let mut bars = flat_bars(3, 100.0);
        for bar in bars.iter_mut() {
            bar.indicators.rsi = Some(75.0);
        }
        bars[0].indicators.adx = Some(15.0);
        bars[1].indicators.adx = Some(30.0);

        generate(&mut bars, &SignalFilters { use_trend_filter: false, adx_threshold: 25.0 });
        assert_eq!(
            signals_of(&bars, SignalIndicator::Rsi),
            vec![Signal::Flat, Signal::Short, Signal::Short]
        );

        generate(&mut bars, &SignalFilters::default());
        assert_eq!(bars[0].signals.rsi, Signal::Short);
    }

    #[test]
    fn test_generate_is_idempotent() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles: Vec<Candle> = (0..300)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.2).sin() * 15.0 + (i as f64 * 0.9).cos() * 3.0;
                Candle {
                    timestamp: start + Duration::hours(i as i64),
                    open: c,
                    high: c + 1.5,
                    low: c - 1.5,
                    close: c,
                    volume: 1.0,
                }
            })
            .collect();
        let mut bars = IndicatorSuite::default().compute(&candles);
        let filters = SignalFilters { use_trend_filter: true, adx_threshold: 20.0 };

        generate(&mut bars, &filters);
        let first = bars.clone();
        generate(&mut bars, &filters);
        assert_eq!(first, bars);

        // Filters only ever remove signals.
        let mut unfiltered = bars.clone();
        generate(&mut unfiltered, &SignalFilters::default());
        for (filtered, raw) in bars.iter().zip(unfiltered.iter()) {
            for indicator in SignalIndicator::ALL {
                let f = filtered.signals.get(indicator);
                assert!(f == Signal::Flat || f == raw.signals.get(indicator));
            }
        }
        assert!(unfiltered.iter().any(|b| b.signals.macd.is_active()));
    }
}
