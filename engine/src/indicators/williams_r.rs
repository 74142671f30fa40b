// Williams %R with an EMA-smoothed companion line
use super::ema::ema_of;
use super::{window_extremes, IndicatorCalculator};
use shared::models::Candle;
use serde_json::Value;

pub struct WilliamsR {
    name: String,
    period: usize,
    smoothing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WilliamsRLines {
    pub raw: Vec<Option<f64>>,
    pub smoothed: Vec<Option<f64>>,
}

impl WilliamsR {
    pub fn new(period: usize, smoothing: usize) -> Self {
        Self {
            name: format!("WILLR({},{})", period, smoothing),
            period,
            smoothing,
        }
    }

    pub fn lines(&self, data: &[Candle]) -> WilliamsRLines {
        let raw = self.calculate(data);
        let smoothed = ema_of(&raw, self.smoothing);
        WilliamsRLines { raw, smoothed }
    }
}

impl IndicatorCalculator for WilliamsR {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "smoothing": self.smoothing })
    }

    /// Raw %R in [-100, 0]; undefined while the window's high equals its low.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let mut results = vec![None; data.len()];
        if self.period == 0 {
            return results;
        }
        for i in (self.period - 1)..data.len() {
            let (highest, lowest) = window_extremes(data, i, self.period);
            let range = highest - lowest;
            if range > 0.0 {
                results[i] = Some((highest - data[i].close) / range * -100.0);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_hlc(high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc::now(),
            open: close, high, low, close,
            volume: 0.0,
        }
    }

    #[test]
    fn test_williams_r_extremes() {
        let mut candles = vec![create_hlc(110.0, 90.0, 100.0); 14];
        candles[13] = create_hlc(110.0, 90.0, 110.0);
        let at_high = WilliamsR::new(14, 6).calculate(&candles);
        assert_eq!(at_high[13], Some(0.0));

        candles[13] = create_hlc(110.0, 90.0, 90.0);
        let at_low = WilliamsR::new(14, 6).calculate(&candles);
        assert_eq!(at_low[13], Some(-100.0));

        candles[13] = create_hlc(110.0, 90.0, 95.0);
        let near_low = WilliamsR::new(14, 6).calculate(&candles);
        assert_eq!(near_low[13], Some(-75.0));
    }

    #[test]
    fn test_smoothed_line_warmup_and_bounds() {
        let candles: Vec<Candle> = (0..40)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.4).cos() * 8.0;
                create_hlc(c + 2.0, c - 2.0, c)
            })
            .collect();
        let lines = WilliamsR::new(14, 6).lines(&candles);
        assert!(lines.raw[..13].iter().all(Option::is_none));
        assert!(lines.raw[13].is_some());
        // EMA(6) seeds on raw values 13..=18
        assert!(lines.smoothed[..18].iter().all(Option::is_none));
        assert!(lines.smoothed[18].is_some());
        for value in lines.raw.iter().chain(lines.smoothed.iter()).flatten() {
            assert!((-100.0..=0.0).contains(value));
        }
    }

    #[test]
    fn test_flat_window_is_undefined() {
        let candles = vec![create_hlc(50.0, 50.0, 50.0); 20];
        assert!(WilliamsR::new(14, 6).calculate(&candles).iter().all(Option::is_none));
    }
}
