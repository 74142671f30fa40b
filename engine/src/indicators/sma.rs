// Simple Moving Average (SMA) over a series with warm-up gaps

/// Defined only where the trailing `period` values are all defined.
pub fn sma_of(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut results = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return results;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().all(Option::is_some) {
            let sum: f64 = window.iter().flatten().sum();
            results[i] = Some(sum / period as f64);
        }
    }
    results
}
