// Exponential Moving Average (EMA) indicator implementation
use super::{closes, IndicatorCalculator};
use shared::models::Candle;
use serde_json::Value;

pub struct Ema {
    name: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        ema_of(&closes(data), self.period)
    }
}

/// EMA over a series that may contain undefined values.
///
/// Seeded with the SMA of the first `period` consecutive defined values. After
/// seeding, an undefined input yields an undefined output and leaves the running
/// average untouched.
pub fn ema_of(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut results = vec![None; values.len()];
    if period == 0 {
        return results;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;
    let mut previous_ema: Option<f64> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(value) = *value else {
            if previous_ema.is_none() {
                seed_sum = 0.0;
                seed_count = 0;
            }
            continue;
        };

        match previous_ema {
            Some(prev) => {
                let ema = (value - prev) * multiplier + prev;
                results[i] = Some(ema);
                previous_ema = Some(ema);
            }
            None => {
                seed_sum += value;
                seed_count += 1;
                if seed_count == period {
                    let sma = seed_sum / period as f64;
                    results[i] = Some(sma);
                    previous_ema = Some(sma);
                }
            }
        }
    }
    results
}
