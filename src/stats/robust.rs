//! NaN-aware location/scale estimators, robust z-score, percentile clipping

use statrs::statistics::Statistics;

use super::EPS;

/// Consistency constant scaling MAD to a normal-distribution sigma.
const MAD_TO_SIGMA: f64 = 1.4826;

fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut v = finite_values(values);
    v.sort_by(f64::total_cmp);
    v
}

/// Mean of finite values, NaN when there are none.
pub fn nanmean(values: &[f64]) -> f64 {
    let v = finite_values(values);
    if v.is_empty() {
        f64::NAN
    } else {
        v.iter().mean()
    }
}

/// Population standard deviation of finite values, NaN when there are none.
pub fn nanstd(values: &[f64]) -> f64 {
    let v = finite_values(values);
    if v.is_empty() {
        f64::NAN
    } else {
        v.iter().population_std_dev()
    }
}

/// Median of finite values, NaN when there are none.
pub fn nanmedian(values: &[f64]) -> f64 {
    percentile_sorted(&sorted_finite(values), 50.0)
}

/// Linear-interpolated percentile of an ascending slice (`q` in 0..=100).
///
/// Position `q/100 * (n-1)` interpolated between neighboring order
/// statistics. NaN for an empty slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}

/// Percentile over the finite values of an unsorted slice.
pub fn nanpercentile(values: &[f64], q: f64) -> f64 {
    percentile_sorted(&sorted_finite(values), q)
}

/// Robust z-score: `(x - median) / (1.4826 * MAD)`.
///
/// Degenerate MAD falls back to `(x - mean) / std`; degenerate std yields
/// all zeros (NaN positions included). Otherwise NaN inputs stay NaN.
pub fn robust_z(values: &[f64]) -> Vec<f64> {
    let med = nanmedian(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let scale = MAD_TO_SIGMA * nanmedian(&deviations);

    if !scale.is_finite() || scale < EPS {
        let sd = nanstd(values);
        if !sd.is_finite() || sd < EPS {
            return vec![0.0; values.len()];
        }
        let mean = nanmean(values);
        return values.iter().map(|v| (v - mean) / (sd + EPS)).collect();
    }

    values.iter().map(|v| (v - med) / (scale + EPS)).collect()
}

/// Output of [`clip_percentile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClipResult {
    pub values: Vec<f64>,
    /// Finite samples moved by more than `EPS`
    pub clipped: usize,
}

/// Winsorize finite values to the `[lo_q, hi_q]` percentiles.
///
/// Fewer than `min_finite` finite values returns the input unchanged with a
/// zero count. NaN samples stay NaN and never count as clipped.
pub fn clip_percentile(values: &[f64], lo_q: f64, hi_q: f64, min_finite: usize) -> ClipResult {
    let sorted = sorted_finite(values);
    if sorted.len() < min_finite || sorted.is_empty() {
        return ClipResult {
            values: values.to_vec(),
            clipped: 0,
        };
    }

    let lo = percentile_sorted(&sorted, lo_q);
    let hi = percentile_sorted(&sorted, hi_q);
    let mut clipped = 0;
    let out = values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return v;
            }
            let c = v.max(lo).min(hi);
            if (c - v).abs() > EPS {
                clipped += 1;
            }
            c
        })
        .collect();

    ClipResult {
        values: out,
        clipped,
    }
}

/// Replace non-finite samples with `fill`.
pub fn fill_non_finite(values: &[f64], fill: f64) -> Vec<f64> {
    values
        .iter()
        .map(|&v| if v.is_finite() { v } else { fill })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile_sorted(&v, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile_sorted(&v, 90.0) - 3.7).abs() < 1e-12);
        assert_eq!(percentile_sorted(&v, 0.0), 1.0);
        assert_eq!(percentile_sorted(&v, 100.0), 4.0);
        assert!(percentile_sorted(&[], 50.0).is_nan());
    }

    #[test]
    fn nan_aware_reductions_skip_missing() {
        let v = [1.0, f64::NAN, 3.0];
        assert_eq!(nanmean(&v), 2.0);
        assert_eq!(nanmedian(&v), 2.0);
        assert!((nanstd(&v) - 1.0).abs() < 1e-12);
        assert!(nanmean(&[f64::NAN]).is_nan());
    }

    #[test]
    fn robust_z_flags_outlier() {
        let mut v: Vec<f64> = (0..50).map(|i| (i % 5) as f64).collect();
        v[25] = 100.0;
        let z = robust_z(&v);
        assert!(z[25] > 10.0);
        assert!(z[0].abs() < 2.0);
    }

    #[test]
    fn robust_z_falls_back_to_std_when_mad_is_zero() {
        // Majority constant: MAD = 0, std > 0.
        let mut v = vec![5.0; 20];
        v[3] = 9.0;
        let z = robust_z(&v);
        assert!(z[3] > 3.0);
        assert!(z.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn robust_z_constant_input_is_all_zero() {
        let v = [2.0, 2.0, f64::NAN, 2.0];
        assert_eq!(robust_z(&v), vec![0.0; 4]);
    }

    #[test]
    fn robust_z_keeps_nan_positions() {
        let v = [1.0, 2.0, f64::NAN, 4.0, 7.0];
        let z = robust_z(&v);
        assert!(z[2].is_nan());
        assert!(z[0].is_finite());
    }

    #[test]
    fn clip_requires_enough_finite_values() {
        let v: Vec<f64> = (0..19).map(f64::from).collect();
        let r = clip_percentile(&v, 1.0, 99.0, 20);
        assert_eq!(r.values, v);
        assert_eq!(r.clipped, 0);
    }

    #[test]
    fn clip_counts_moved_points_and_keeps_nan() {
        let mut v: Vec<f64> = (0..100).map(f64::from).collect();
        v[50] = f64::NAN;
        let r = clip_percentile(&v, 1.0, 99.0, 20);
        assert!(r.values[50].is_nan());
        assert_eq!(r.clipped, 2);
        assert!(r.values[0] > 0.0);
        assert!(r.values[99] < 99.0);
    }
}
