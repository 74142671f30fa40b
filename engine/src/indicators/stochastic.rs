// Slow Stochastic oscillator: %K = SMA of the fast stochastic, %D = SMA of %K
use super::sma::sma_of;
use super::{window_extremes, IndicatorCalculator};
use shared::models::Candle;
use serde_json::Value;

pub struct Stochastic {
    name: String,
    k_period: usize,
    k_smoothing: usize,
    d_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticLines {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

impl Stochastic {
    pub fn new(k_period: usize, k_smoothing: usize, d_period: usize) -> Self {
        Self {
            name: format!("STOCH({},{},{})", k_period, k_smoothing, d_period),
            k_period,
            k_smoothing,
            d_period,
        }
    }

    /// Raw %K over `k_period`; undefined while the window's high equals its low.
    pub fn fast_k(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let mut results = vec![None; data.len()];
        if self.k_period == 0 {
            return results;
        }
        for i in (self.k_period.saturating_sub(1))..data.len() {
            let (highest, lowest) = window_extremes(data, i, self.k_period);
            let range = highest - lowest;
            if range > 0.0 {
                results[i] = Some((data[i].close - lowest) / range * 100.0);
            }
        }
        results
    }

    pub fn lines(&self, data: &[Candle]) -> StochasticLines {
        let k = sma_of(&self.fast_k(data), self.k_smoothing);
        let d = sma_of(&k, self.d_period);
        StochasticLines { k, d }
    }
}

impl IndicatorCalculator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "k_period": self.k_period,
            "k_smoothing": self.k_smoothing,
            "d_period": self.d_period,
        })
    }

    /// Slow %K; use [`Stochastic::lines`] for %D.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        self.lines(data).k
    }
}
