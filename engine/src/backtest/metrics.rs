//! Equity-curve metrics. Pure functions, no state.

/// Percentage change from `initial` to `final_capital`. 0 when `initial` is not positive.
pub fn total_return_pct(final_capital: f64, initial: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_capital - initial) / initial * 100.0
}

/// Deepest fall from a running peak, as a non-positive percentage.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd: f64 = 0.0;
    for &equity in equity_curve {
        peak = peak.max(equity);
        if peak > 0.0 {
            max_dd = max_dd.min((equity - peak) / peak);
        }
    }
    max_dd * 100.0
}

/// `part / whole` as a percentage, 0 for an empty denominator.
pub fn rate_pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
