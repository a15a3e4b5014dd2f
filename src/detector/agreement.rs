//! Cross-Curve Agreement Tracker
//!
//! Per-sample fraction of analyzed curves whose anomaly mask is set. The
//! signal only exists with at least two contributing curves; otherwise it
//! is all zeros.

/// Minimum contributing curves for a non-zero agreement signal.
pub const MIN_AGREEMENT_CURVES: usize = 2;

/// Fraction of `masks` flagged at each of the `n` samples.
pub fn agreement_signal(masks: &[Vec<bool>], n: usize) -> Vec<f64> {
    if masks.len() < MIN_AGREEMENT_CURVES {
        return vec![0.0; n];
    }
    let k = masks.len() as f64;
    (0..n)
        .map(|i| {
            let flagged = masks
                .iter()
                .filter(|m| m.get(i).copied().unwrap_or(false))
                .count();
            flagged as f64 / k
        })
        .collect()
}

/// Mean of `signal[start..=end]`, 0 for an empty or out-of-range span.
pub fn mean_agreement(signal: &[f64], start: usize, end: usize) -> f64 {
    if signal.is_empty() || start > end || start >= signal.len() {
        return 0.0;
    }
    let end = end.min(signal.len() - 1);
    let span = &signal[start..=end];
    span.iter().sum::<f64>() / span.len() as f64
}
