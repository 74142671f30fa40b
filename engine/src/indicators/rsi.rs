// Relative Strength Index (RSI) indicator implementation
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }

    // Both averages zero means the window never moved; there is no strength to report.
    fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
        if avg_loss == 0.0 {
            if avg_gain == 0.0 {
                None
            } else {
                Some(100.0)
            }
        } else {
            let rs = avg_gain / avg_loss;
            Some(100.0 - (100.0 / (1.0 + rs)))
        }
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        if data.len() <= self.period || self.period == 0 {
            return vec![None; data.len()];
        }

        let mut results = vec![None; self.period]; // RSI needs 'period' initial changes

        let mut gains = 0.0;
        let mut losses = 0.0;

        // Initial averages are plain means of the first `period` changes
        for i in 1..=self.period {
            let change = data[i].close - data[i - 1].close;
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change; // losses are positive values
            }
        }

        let mut avg_gain = gains / self.period as f64;
        let mut avg_loss = losses / self.period as f64;
        results.push(Self::rsi_from_averages(avg_gain, avg_loss));

        // Wilder smoothing afterwards
        for i in (self.period + 1)..data.len() {
            let change = data[i].close - data[i - 1].close;
            let (current_gain, current_loss) = if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            };

            avg_gain = (avg_gain * (self.period - 1) as f64 + current_gain) / self.period as f64;
            avg_loss = (avg_loss * (self.period - 1) as f64 + current_loss) / self.period as f64;
            results.push(Self::rsi_from_averages(avg_gain, avg_loss));
        }
        results
    }
}
