// Rate of Change (ROC), in percent
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Roc {
    name: String,
    period: usize,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("ROC({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let mut results = vec![None; data.len()];
        if self.period == 0 {
            return results;
        }
        for i in self.period..data.len() {
            let base = data[i - self.period].close;
            if base != 0.0 {
                results[i] = Some((data[i].close - base) / base * 100.0);
            }
        }
        results
    }
}
