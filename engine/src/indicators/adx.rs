// Average Directional Index (ADX), Wilder's trend-strength measure in [0, 100]
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Adx {
    name: String,
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("ADX({})", period),
            period,
        }
    }

    // Zero smoothed ranges mean no directional movement, so DX is 0 rather than undefined.
    fn directional_index(smoothed_tr: f64, smoothed_plus: f64, smoothed_minus: f64) -> f64 {
        if smoothed_tr <= 0.0 {
            return 0.0;
        }
        let plus_di = 100.0 * smoothed_plus / smoothed_tr;
        let minus_di = 100.0 * smoothed_minus / smoothed_tr;
        let di_sum = plus_di + minus_di;
        if di_sum <= 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        }
    }
}

impl IndicatorCalculator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let n = data.len();
        let period = self.period;
        let mut results = vec![None; n];
        // First ADX needs `period` DX values, the first of which needs `period` changes.
        if period == 0 || n < 2 * period {
            return results;
        }

        let mut true_range = vec![0.0; n];
        let mut plus_dm = vec![0.0; n];
        let mut minus_dm = vec![0.0; n];
        for i in 1..n {
            let (cur, prev) = (&data[i], &data[i - 1]);
            let up_move = cur.high - prev.high;
            let down_move = prev.low - cur.low;
            plus_dm[i] = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
            minus_dm[i] = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };
            true_range[i] = (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs());
        }

        let mut smoothed_tr: f64 = true_range[1..=period].iter().sum();
        let mut smoothed_plus: f64 = plus_dm[1..=period].iter().sum();
        let mut smoothed_minus: f64 = minus_dm[1..=period].iter().sum();

        let period_f = period as f64;
        let mut dx_sum = Self::directional_index(smoothed_tr, smoothed_plus, smoothed_minus);
        let mut adx: Option<f64> = if period == 1 { Some(dx_sum) } else { None };
        results[period] = adx;

        for i in (period + 1)..n {
            smoothed_tr = smoothed_tr - smoothed_tr / period_f + true_range[i];
            smoothed_plus = smoothed_plus - smoothed_plus / period_f + plus_dm[i];
            smoothed_minus = smoothed_minus - smoothed_minus / period_f + minus_dm[i];
            let dx = Self::directional_index(smoothed_tr, smoothed_plus, smoothed_minus);

            adx = match adx {
                Some(prev) => Some((prev * (period_f - 1.0) + dx) / period_f),
                None => {
                    dx_sum += dx;
                    if i == 2 * period - 1 {
                        Some(dx_sum / period_f)
                    } else {
                        None
                    }
                }
            };
            results[i] = adx;
        }
        results
    }
}
