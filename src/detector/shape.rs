//! Run shape classification: spike / drift / step_change / noisy_zone

use crate::stats::{gradient_unit, nanmean, nanmedian, nanstd, EPS};
use crate::types::IntervalShape;

/// Segments shorter than this are always spikes.
const MIN_CLASSIFIABLE_SAMPLES: usize = 4;

/// Depth span below which a peaky segment is a spike.
const SPIKE_MAX_SPAN: f64 = 12.0;

/// Peak deviation / stdev above which a short segment is a spike.
const SPIKE_PEAK_RATIO: f64 = 2.0;

/// Curvature / slope-strength ratio below which a segment is a drift.
const DRIFT_CURVATURE_RATIO: f64 = 0.12;

/// Half-to-half mean shift / stdev above which a segment is a step change.
const STEP_MEAN_SHIFT: f64 = 0.8;

fn max_finite(values: impl Iterator<Item = f64>) -> f64 {
    values
        .filter(|v| v.is_finite())
        .fold(f64::NAN, |acc, v| if acc.is_nan() { v } else { acc.max(v) })
}

/// Classify the samples `[start, end]` of a clipped curve.
///
/// First matching rule wins:
/// 1. fewer than 4 samples -> spike
/// 2. span < 12 and peakiness / stdev > 2 -> spike
/// 3. curvature < 0.12 * slope strength (slope strength > 0) -> drift
/// 4. |mean(second half) - mean(first half)| / stdev > 0.8 -> step change
/// 5. otherwise noisy zone
pub fn classify(values: &[f64], depths: &[f64], start: usize, end: usize) -> IntervalShape {
    let seg = &values[start..=end];
    if seg.len() < MIN_CLASSIFIABLE_SAMPLES {
        return IntervalShape::Spike;
    }

    let span = (depths[end] - depths[start]).max(1e-6);
    let fill = nanmedian(seg);
    let filled: Vec<f64> = seg
        .iter()
        .map(|&v| if v.is_nan() { fill } else { v })
        .collect();

    let d1 = gradient_unit(&filled);
    let d2 = gradient_unit(&d1);

    let center = nanmedian(&filled);
    let peakiness = max_finite(filled.iter().map(|v| (v - center).abs()));
    let abs_d1: Vec<f64> = d1.iter().map(|v| v.abs()).collect();
    let abs_d2: Vec<f64> = d2.iter().map(|v| v.abs()).collect();
    let slope_strength = nanmean(&abs_d1);
    let curvature = nanmean(&abs_d2);
    let stdev = nanstd(&filled) + EPS;

    if span < SPIKE_MAX_SPAN && peakiness / stdev > SPIKE_PEAK_RATIO {
        return IntervalShape::Spike;
    }

    if curvature < DRIFT_CURVATURE_RATIO * (slope_strength + EPS) && slope_strength > 0.0 {
        return IntervalShape::Drift;
    }

    let mid = filled.len() / 2;
    if mid > 1 {
        let m1 = nanmean(&filled[..mid]);
        let m2 = nanmean(&filled[mid..]);
        if (m2 - m1).abs() / stdev > STEP_MEAN_SHIFT {
            return IntervalShape::StepChange;
        }
    }

    IntervalShape::NoisyZone
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depths(n: usize, step: f64) -> Vec<f64> {
        (0..n).map(|i| 1000.0 + i as f64 * step).collect()
    }

    #[test]
    fn short_segment_is_spike() {
        let v = [1.0, 5.0, 1.0];
        assert_eq!(classify(&v, &depths(3, 1.0), 0, 2), IntervalShape::Spike);
    }

    #[test]
    fn narrow_peak_is_spike() {
        let v = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(classify(&v, &depths(8, 1.0), 0, 7), IntervalShape::Spike);
    }

    #[test]
    fn linear_ramp_is_drift() {
        let v: Vec<f64> = (0..30).map(f64::from).collect();
        assert_eq!(classify(&v, &depths(30, 1.0), 0, 29), IntervalShape::Drift);
    }

    #[test]
    fn level_shift_is_step_change() {
        let v: Vec<f64> = (0..30)
            .map(|i| if i < 15 { 0.0 } else { 5.0 } + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        assert_eq!(
            classify(&v, &depths(30, 1.0), 0, 29),
            IntervalShape::StepChange
        );
    }

    #[test]
    fn alternating_noise_is_noisy_zone() {
        let v: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert_eq!(
            classify(&v, &depths(30, 1.0), 0, 29),
            IntervalShape::NoisyZone
        );
    }
}
