// Technical indicators module
pub mod adx;
pub mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod williams_r;

use std::collections::BTreeMap;

use shared::models::{AnnotatedBar, Candle};
use serde_json::Value;
use tracing::debug;

use adx::Adx;
use ema::Ema;
use macd::Macd;
use roc::Roc;
use rsi::Rsi;
use stochastic::Stochastic;
use williams_r::WilliamsR;

/// Below this many bars no indicator is computed at all.
pub const MIN_BARS: usize = 50;

// Common trait for all indicators
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>>; // None while warming up or on a degenerate denominator
}

pub(crate) fn closes(data: &[Candle]) -> Vec<Option<f64>> {
    data.iter().map(|c| Some(c.close)).collect()
}

/// Highest high and lowest low of the `period` bars ending at `end` (inclusive).
pub(crate) fn window_extremes(data: &[Candle], end: usize, period: usize) -> (f64, f64) {
    let start = (end + 1).saturating_sub(period);
    data[start..=end]
        .iter()
        .fold((f64::MIN, f64::MAX), |(hh, ll), c| (hh.max(c.high), ll.min(c.low)))
}

/// The fixed indicator set the signal rules are written against.
pub struct IndicatorSuite {
    rsi: Rsi,
    macd: Macd,
    roc: Roc,
    stochastic: Stochastic,
    williams_r: WilliamsR,
    adx: Adx,
    trend: Ema,
}

impl Default for IndicatorSuite {
    fn default() -> Self {
        Self {
            rsi: Rsi::new(14),
            macd: Macd::new(12, 26, 9),
            roc: Roc::new(10),
            stochastic: Stochastic::new(14, 3, 3),
            williams_r: WilliamsR::new(14, 6),
            adx: Adx::new(14),
            trend: Ema::new(200),
        }
    }
}

impl IndicatorSuite {
    fn calculators(&self) -> [&dyn IndicatorCalculator; 7] {
        [
            &self.rsi,
            &self.macd,
            &self.roc,
            &self.stochastic,
            &self.williams_r,
            &self.adx,
            &self.trend,
        ]
    }

    /// Parameter descriptors keyed by indicator name, e.g. `"RSI(14)" -> {"period": 14}`.
    pub fn parameters(&self) -> BTreeMap<String, Value> {
        self.calculators()
            .iter()
            .map(|calc| (calc.name().to_string(), calc.parameters()))
            .collect()
    }

    /// Annotates every candle with the full indicator set.
    ///
    /// Series shorter than [`MIN_BARS`] come back with every value undefined.
    /// Signals are left flat; see [`crate::signals::generate`].
    pub fn compute(&self, candles: &[Candle]) -> Vec<AnnotatedBar> {
        let mut bars: Vec<AnnotatedBar> = candles.iter().copied().map(AnnotatedBar::from).collect();
        if candles.len() < MIN_BARS {
            debug!(bars = candles.len(), min = MIN_BARS, "Series too short, indicators left undefined");
            return bars;
        }

        let rsi = self.rsi.calculate(candles);
        let macd = self.macd.lines(candles);
        let roc = self.roc.calculate(candles);
        let stoch = self.stochastic.lines(candles);
        let willr = self.williams_r.lines(candles);
        let adx = self.adx.calculate(candles);
        let trend = self.trend.calculate(candles);

        for (i, bar) in bars.iter_mut().enumerate() {
            let values = &mut bar.indicators;
            values.rsi = rsi[i];
            values.macd = macd.macd[i];
            values.macd_signal = macd.signal[i];
            values.macd_hist = macd.histogram[i];
            values.roc = roc[i];
            values.stoch_k = stoch.k[i];
            values.stoch_d = stoch.d[i];
            values.willr = willr.raw[i];
            values.willr_smoothed = willr.smoothed[i];
            values.ema_trend = trend[i];
            values.adx = adx[i];
        }
        debug!(bars = bars.len(), "Indicators computed");
        bars
    }
}
