//! Head-vs-tail trend labels
//!
//! Two call sites use the same comparison with different minimum sample
//! floors (6 for curve statistics, 12 for LLM diagnostics). The floors stay
//! separate: unifying them changes labels at boundary sample counts.

use crate::types::Trend;

/// Minimum finite samples for a curve-statistics trend.
pub const CURVE_TREND_MIN_SAMPLES: usize = 6;

/// Minimum samples for a diagnostics trend.
pub const DIAGNOSTIC_TREND_MIN_SAMPLES: usize = 12;

/// Relative head/tail change that counts as a trend.
const TREND_REL_CHANGE: f64 = 0.08;

/// Relative change between the mean of the first and last windows.
///
/// Window = max(3, n/5). `None` below `min_samples` or when either mean is
/// non-finite.
pub fn trend_ratio(values: &[f64], min_samples: usize) -> Option<f64> {
    let n = values.len();
    if n < min_samples || n == 0 {
        return None;
    }
    let window = (n / 5).max(3).min(n);
    let head = values[..window].iter().sum::<f64>() / window as f64;
    let tail = values[n - window..].iter().sum::<f64>() / window as f64;
    if !head.is_finite() || !tail.is_finite() {
        return None;
    }
    let scale = head.abs().max(tail.abs()).max(1e-9);
    Some((tail - head) / scale)
}

/// Trend label for curve statistics (floor of 6 samples).
pub fn curve_trend(values: &[f64]) -> Trend {
    match trend_ratio(values, CURVE_TREND_MIN_SAMPLES) {
        None => Trend::Insufficient,
        Some(rel) if rel >= TREND_REL_CHANGE => Trend::Increasing,
        Some(rel) if rel <= -TREND_REL_CHANGE => Trend::Decreasing,
        Some(_) => Trend::Stable,
    }
}

/// Trend phrase for LLM diagnostics (floor of 12 samples).
pub fn diagnostic_trend(values: &[f64]) -> &'static str {
    match trend_ratio(values, DIAGNOSTIC_TREND_MIN_SAMPLES) {
        None => "insufficient points",
        Some(rel) if rel >= TREND_REL_CHANGE => "increasing with depth",
        Some(rel) if rel <= -TREND_REL_CHANGE => "decreasing with depth",
        Some(_) => "mostly stable",
    }
}
