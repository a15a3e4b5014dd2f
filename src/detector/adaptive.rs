//! Adaptive sample-count constants derived from the median depth step
//!
//! Windows are specified in depth units and converted to sample counts so
//! the detector behaves the same on 0.5 ft and 2 ft sampled logs. Rounding
//! is half-to-even.

use crate::config::DetectionConfig;
use crate::stats::median_positive_step;

/// Smallest step used as a divisor.
const MIN_STEP: f64 = 1e-6;

/// Step assumed when the depth series has no positive differences.
pub const DEFAULT_STEP: f64 = 1.0;

fn samples_for(depth_span: f64, step: f64) -> f64 {
    (depth_span / step.max(MIN_STEP)).round_ties_even()
}

/// Rolling-mean window: `clamp(min, max, round(target / step))`.
pub fn smoothing_window(step: f64, cfg: &DetectionConfig) -> usize {
    let raw = samples_for(cfg.smoothing_target_depth, step);
    raw.min(cfg.smoothing_window_max as f64)
        .max(cfg.smoothing_window_min as f64) as usize
}

/// Minimum run length: `max(floor, round(min_run_depth / step))`.
pub fn min_run_length(step: f64, cfg: &DetectionConfig) -> usize {
    samples_for(cfg.min_run_depth, step).max(cfg.min_run_floor as f64) as usize
}

/// Merge gap in samples: `max(floor, round(merge_gap_depth / step))`.
pub fn merge_gap(step: f64, cfg: &DetectionConfig) -> usize {
    samples_for(cfg.merge_gap_depth, step).max(cfg.merge_gap_floor as f64) as usize
}

/// All sample-count constants for one depth series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveWindows {
    pub step: f64,
    pub smoothing_window: usize,
    pub min_run: usize,
    pub merge_gap: usize,
}

impl AdaptiveWindows {
    pub fn from_depths(depths: &[f64], cfg: &DetectionConfig) -> Self {
        Self::from_step(median_positive_step(depths).unwrap_or(DEFAULT_STEP), cfg)
    }

    pub fn from_step(step: f64, cfg: &DetectionConfig) -> Self {
        Self {
            step,
            smoothing_window: smoothing_window(step, cfg),
            min_run: min_run_length(step, cfg),
            merge_gap: merge_gap(step, cfg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_step_constants() {
        let w = AdaptiveWindows::from_step(1.0, &DetectionConfig::default());
        assert_eq!(w.smoothing_window, 18);
        assert_eq!(w.min_run, 6);
        assert_eq!(w.merge_gap, 4);
    }

    #[test]
    fn fine_and_coarse_steps_hit_the_clamps() {
        let cfg = DetectionConfig::default();
        assert_eq!(smoothing_window(0.1, &cfg), 121);
        assert_eq!(smoothing_window(5.0, &cfg), 9);
        assert_eq!(min_run_length(5.0, &cfg), 4);
        assert_eq!(merge_gap(5.0, &cfg), 2);
    }

    #[test]
    fn rounding_is_half_to_even() {
        let cfg = DetectionConfig::default();
        // 6 / 1.2 = 5.0, 4 / 1.6 = 2.5 -> 2, 18 / 1.2 = 15
        assert_eq!(min_run_length(1.2, &cfg), 5);
        assert_eq!(merge_gap(1.6, &cfg), 2);
        assert_eq!(smoothing_window(1.2, &cfg), 15);
    }

    #[test]
    fn quarter_step_scenario() {
        let w = AdaptiveWindows::from_step(1.25, &DetectionConfig::default());
        // 18/1.25 = 14.4, 6/1.25 = 4.8, 4/1.25 = 3.2
        assert_eq!(w.smoothing_window, 14);
        assert_eq!(w.min_run, 5);
        assert_eq!(w.merge_gap, 3);
    }

    #[test]
    fn missing_step_defaults_to_one() {
        let w = AdaptiveWindows::from_depths(&[10.0], &DetectionConfig::default());
        assert_eq!(w.step, DEFAULT_STEP);
    }
}
