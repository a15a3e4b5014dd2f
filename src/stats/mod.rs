//! Robust Statistics Toolkit
//!
//! NaN-aware leaf utilities shared by every pipeline stage. Missing samples
//! are carried as `f64::NAN` so arrays stay aligned to the depth series.
//!
//! ## Key Features
//!
//! - **Robust z-score**: median/MAD normalization with mean/std and all-zero
//!   fallbacks, so degenerate inputs never produce division by zero
//! - **Percentile clipping**: [p1, p99] winsorizing over finite values only
//! - **Masked rolling mean**: value and finite-mask convolutions divided
//!   pointwise, which shapes residuals near missing-data edges
//! - **Gradients**: second-order interior differences, spacing aware
//! - **Correlation / slope / trend**: safe scalar summaries returning
//!   documented defaults instead of errors
//!
//! Every function here is pure and allocation-local.

mod correlation;
mod robust;
mod smoothing;
mod trend;

pub use correlation::*;
pub use robust::*;
pub use smoothing::*;
pub use trend::*;

/// Numerical floor used in every ratio and degeneracy check.
pub const EPS: f64 = 1e-9;

/// Round to `digits` decimal places for the JSON surface.
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(digits);
    (value * factor).round_ties_even() / factor
}

/// Clamp that passes NaN through unchanged.
pub fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        value
    } else {
        value.max(lo).min(hi)
    }
}

/// Number of finite samples.
pub fn finite_count(values: &[f64]) -> usize {
    values.iter().filter(|v| v.is_finite()).count()
}

/// Fraction of finite samples, 0 for an empty slice.
pub fn finite_fraction(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        finite_count(values) as f64 / values.len() as f64
    }
}

/// Median of the strictly positive, finite consecutive depth differences.
pub fn median_positive_step(depths: &[f64]) -> Option<f64> {
    let steps: Vec<f64> = depths
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| d.is_finite() && *d > 0.0)
        .collect();
    let m = nanmedian(&steps);
    m.is_finite().then_some(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_matches_decimal_rounding() {
        assert_eq!(round_to(0.123_456, 3), 0.123);
        assert_eq!(round_to(2.0, 3), 2.0);
        assert_eq!(round_to(-1.23456, 2), -1.23);
        assert!(round_to(f64::NAN, 3).is_nan());
    }

    #[test]
    fn median_step_ignores_non_positive_diffs() {
        assert_eq!(median_positive_step(&[0.0, 1.0, 1.0, 3.0, 4.0]), Some(1.0));
        assert_eq!(median_positive_step(&[5.0]), None);
    }

    #[test]
    fn finite_fraction_of_empty_is_zero() {
        assert_eq!(finite_fraction(&[]), 0.0);
        assert_eq!(finite_fraction(&[1.0, f64::NAN]), 0.5);
    }
}
