//! Per-Curve Anomaly Detector
//!
//! Scores every sample of every usable curve against its local baseline and
//! extracts contiguous anomalous runs.
//!
//! ## Algorithm
//!
//! For each curve with at least 30% finite samples:
//! 1. Clip to the [p1, p99] envelope (counts clipped points for data quality)
//! 2. Smooth with the masked rolling mean; residual = clipped - smoothed
//! 3. Level anomaly = |robust z(residual)|
//! 4. Slope anomaly = |robust z(gradient of median-filled curve vs depth)|
//! 5. Score = 0.62 * level + 0.38 * slope, non-finite scores set to 0
//! 6. Threshold = max(2.6, p92 of the curve's own scores)
//! 7. Runs of at least `min_run` flagged samples become raw intervals,
//!    each carrying its mean score and a shape label
//!
//! Each analyzed curve also yields a severity proxy, clip(p95 / 7, 0, 1),
//! which feeds the global anomaly score.

pub mod adaptive;
pub mod agreement;
pub mod shape;

pub use adaptive::AdaptiveWindows;
pub use agreement::{agreement_signal, mean_agreement};

use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::preparation::PreparedCurves;
use crate::stats::{
    clip, clip_percentile, fill_non_finite, finite_fraction, gradient, nanmean, nanmedian,
    nanpercentile, robust_z, rolling_mean,
};
use crate::types::IntervalShape;

/// A single-curve run before consolidation. Indices are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInterval {
    pub start: usize,
    pub end: usize,
    pub score: f64,
    pub curves: Vec<String>,
    pub shape: IntervalShape,
}

/// Scores and mask of one analyzed curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveScores {
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub mask: Vec<bool>,
    /// Clipped samples, input to shape classification
    pub clipped_values: Vec<f64>,
    pub clipped_points: usize,
    pub severity_proxy: f64,
}

/// Everything the consolidator and aggregators need from detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOutcome {
    pub raw_intervals: Vec<RawInterval>,
    /// Anomaly masks of analyzed curves, in caller order
    pub masks: Vec<Vec<bool>>,
    pub severity_proxies: Vec<f64>,
    pub clipped_points: usize,
    /// Samples across every requested curve, analyzed or not
    pub raw_points: usize,
    pub excluded_curves: Vec<String>,
}

/// Contiguous `true` runs of a mask as inclusive `(start, end)` pairs.
pub fn contiguous_runs(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < mask.len() {
        if !mask[i] {
            i += 1;
            continue;
        }
        let mut j = i;
        while j + 1 < mask.len() && mask[j + 1] {
            j += 1;
        }
        runs.push((i, j));
        i = j + 1;
    }
    runs
}

/// Per-curve anomaly detector
pub struct CurveDetector;

impl CurveDetector {
    /// Run detection over every prepared curve.
    pub fn detect(
        prepared: &PreparedCurves,
        windows: &AdaptiveWindows,
        cfg: &DetectionConfig,
    ) -> DetectionOutcome {
        let mut outcome = DetectionOutcome::default();

        for curve in &prepared.curves {
            outcome.raw_points += curve.values.len();

            let finite_ratio = finite_fraction(&curve.values);
            if finite_ratio < cfg.min_finite_fraction {
                warn!(
                    curve = %curve.name,
                    finite_ratio = finite_ratio,
                    "Curve too sparse for detection, excluded"
                );
                outcome.excluded_curves.push(curve.name.clone());
                continue;
            }

            let scored = Self::score_curve(&curve.values, &prepared.depths, windows, cfg);
            outcome.clipped_points += scored.clipped_points;

            let runs: Vec<(usize, usize)> = contiguous_runs(&scored.mask)
                .into_iter()
                .filter(|(i, j)| j - i + 1 >= windows.min_run)
                .collect();

            debug!(
                curve = %curve.name,
                threshold = scored.threshold,
                runs = runs.len(),
                severity_proxy = scored.severity_proxy,
                "Curve scored"
            );

            for (i, j) in runs {
                outcome.raw_intervals.push(RawInterval {
                    start: i,
                    end: j,
                    score: nanmean(&scored.scores[i..=j]),
                    curves: vec![curve.name.clone()],
                    shape: shape::classify(&scored.clipped_values, &prepared.depths, i, j),
                });
            }

            outcome.severity_proxies.push(scored.severity_proxy);
            outcome.masks.push(scored.mask);
        }

        outcome
    }

    /// Composite level + slope anomaly score of one curve.
    pub fn score_curve(
        values: &[f64],
        depths: &[f64],
        windows: &AdaptiveWindows,
        cfg: &DetectionConfig,
    ) -> CurveScores {
        let clipped = clip_percentile(
            values,
            cfg.clip_low_percentile,
            cfg.clip_high_percentile,
            cfg.clip_min_finite,
        );
        let x = clipped.values;

        let smooth = rolling_mean(&x, windows.smoothing_window);
        let resid: Vec<f64> = x.iter().zip(&smooth).map(|(a, b)| a - b).collect();
        let z_level = robust_z(&resid);

        let filled = fill_non_finite(&x, nanmedian(&x));
        let z_slope = robust_z(&gradient(&filled, depths));

        let scores: Vec<f64> = z_level
            .iter()
            .zip(&z_slope)
            .map(|(l, s)| {
                let v = cfg.level_weight * l.abs() + cfg.slope_weight * s.abs();
                if v.is_finite() {
                    v
                } else {
                    0.0
                }
            })
            .collect();

        let threshold = cfg
            .threshold_floor
            .max(nanpercentile(&scores, cfg.threshold_percentile));
        let mask = scores.iter().map(|s| *s >= threshold).collect();
        let severity_proxy = clip(
            nanpercentile(&scores, cfg.severity_percentile) / cfg.severity_scale,
            0.0,
            1.0,
        );

        CurveScores {
            scores,
            threshold,
            mask,
            clipped_values: x,
            clipped_points: clipped.clipped,
            severity_proxy: if severity_proxy.is_finite() {
                severity_proxy
            } else {
                0.0
            },
        }
    }
}
