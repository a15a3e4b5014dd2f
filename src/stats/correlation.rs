//! Pearson correlation, least-squares slope, correlation significance
//!
//! Uses the statrs crate for the Student's t-distribution behind the
//! p-value of a correlation coefficient.

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

use super::EPS;

/// Minimum jointly-finite samples for `safe_corr` and `linear_slope`.
pub const MIN_JOINT_SAMPLES: usize = 5;

fn joint_finite(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .unzip()
}

/// Pearson correlation over jointly-finite samples.
///
/// Returns 0.0 (never NaN) with fewer than 5 joint samples, near-zero
/// variance in either series, or a non-finite result.
pub fn safe_corr(a: &[f64], b: &[f64]) -> f64 {
    let (x, y) = joint_finite(a, b);
    if x.len() < MIN_JOINT_SAMPLES {
        return 0.0;
    }
    if x.iter().population_std_dev() < EPS || y.iter().population_std_dev() < EPS {
        return 0.0;
    }
    match pearson(&x, &y) {
        Some(r) if r.is_finite() => r,
        _ => 0.0,
    }
}

/// Plain Pearson correlation over the common prefix of two series.
///
/// `None` with fewer than 3 samples or zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 3 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().mean();
    let mean_b = b.iter().mean();

    let mut num = 0.0;
    let mut den_a = 0.0;
    let mut den_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        num += dx * dy;
        den_a += dx * dx;
        den_b += dy * dy;
    }

    let denom = (den_a * den_b).sqrt();
    if denom == 0.0 {
        None
    } else {
        Some(num / denom)
    }
}

/// Least-squares slope of `values` against `depths` over joint-finite pairs.
///
/// 0.0 with fewer than 5 pairs or a degenerate depth spread.
pub fn linear_slope(depths: &[f64], values: &[f64]) -> f64 {
    let (x, y) = joint_finite(depths, values);
    if x.len() < MIN_JOINT_SAMPLES {
        return 0.0;
    }
    let mx = x.iter().mean();
    let my = y.iter().mean();
    let denom: f64 = x.iter().map(|v| (v - mx) * (v - mx)).sum();
    if denom < EPS {
        return 0.0;
    }
    let num: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();
    num / denom
}

/// Two-tailed p-value of Pearson `r` over `n` samples.
///
/// t = r * sqrt(n-2) / sqrt(1-r^2) against Student's t with n-2 degrees of
/// freedom. 1.0 when n < 3, 0.0 for |r| at or near 1.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 || !r.is_finite() {
        return 1.0;
    }
    if r.abs() >= 0.9999 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}
