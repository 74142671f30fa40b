// Moving Average Convergence Divergence (MACD)
use super::ema::ema_of;
use super::{closes, IndicatorCalculator};
use shared::models::Candle;
use serde_json::Value;

pub struct Macd {
    name: String,
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            name: format!("MACD({},{},{})", fast_period, slow_period, signal_period),
            fast_period,
            slow_period,
            signal_period,
        }
    }

    /// All three lines share one warm-up: the MACD line stays undefined until its
    /// signal line is seeded.
    pub fn lines(&self, data: &[Candle]) -> MacdLines {
        let closes = closes(data);
        let fast = ema_of(&closes, self.fast_period);
        let slow = ema_of(&closes, self.slow_period);

        let spread: Vec<Option<f64>> = fast
            .iter()
            .zip(slow.iter())
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = ema_of(&spread, self.signal_period);

        let macd: Vec<Option<f64>> = spread
            .iter()
            .zip(signal.iter())
            .map(|(m, s)| s.and(*m))
            .collect();
        let histogram = macd
            .iter()
            .zip(signal.iter())
            .map(|(m, s)| Some((*m)? - (*s)?))
            .collect();

        MacdLines { macd, signal, histogram }
    }
}

impl IndicatorCalculator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "fast_period": self.fast_period,
            "slow_period": self.slow_period,
            "signal_period": self.signal_period,
        })
    }

    /// The MACD line; use [`Macd::lines`] for signal and histogram.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        self.lines(data).macd
    }
}
