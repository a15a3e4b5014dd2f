//! Data Quality Assessor
//!
//! One record per analysis: null and clipped fractions, effective rows,
//! depth resolution, a quality band and human-readable warnings.
//!
//! quality = 0.45 * (1 - null) + 0.30 * (1 - clipped) + 0.25 * clip(rows / 2000, 0, 1)

use crate::preparation::PreparedCurves;
use crate::stats::{clip, finite_fraction, median_positive_step, round_to};
use crate::types::{DataQuality, QualityBand};

// ============================================================================
// Thresholds
// ============================================================================

const NULL_WEIGHT: f64 = 0.45;
const CLIPPED_WEIGHT: f64 = 0.30;
const ROWS_WEIGHT: f64 = 0.25;

/// Effective rows at which the row term saturates.
const ROWS_SATURATION: f64 = 2000.0;

const WARN_NULL_FRACTION: f64 = 0.35;
const WARN_CLIPPED_FRACTION: f64 = 0.20;
const WARN_EFFECTIVE_ROWS: usize = 200;
const WARN_DEPTH_RESOLUTION: f64 = 3.0;
const WARN_MEAN_VALID: f64 = 0.55;

pub const NO_DATA_WARNING: &str = "No curve data available.";

/// Data quality assessment
pub struct DataQualityAssessor;

impl DataQualityAssessor {
    /// Assess prepared curves.
    ///
    /// `clipped_points` / `raw_points` come from detection; `excluded` lists
    /// curves the detector skipped as too sparse.
    pub fn assess(
        prepared: &PreparedCurves,
        clipped_points: usize,
        raw_points: usize,
        excluded: &[String],
    ) -> DataQuality {
        if prepared.curves.is_empty() {
            return DataQuality {
                null_fraction: 1.0,
                null_percent: 100.0,
                effective_rows: 0,
                depth_resolution_median: None,
                clipped_fraction: 0.0,
                clipped_percent: 0.0,
                quality_band: QualityBand::Low,
                warnings: vec![NO_DATA_WARNING.to_string()],
                excluded_curves: excluded.to_vec(),
            };
        }

        let valid_rates: Vec<f64> = prepared
            .curves
            .iter()
            .map(|c| finite_fraction(&c.values))
            .collect();
        let mean_valid = valid_rates.iter().sum::<f64>() / valid_rates.len() as f64;
        let null_frac = clip(1.0 - mean_valid, 0.0, 1.0);

        let effective_rows = (0..prepared.len())
            .filter(|&i| {
                prepared
                    .curves
                    .iter()
                    .any(|c| c.values.get(i).is_some_and(|v| v.is_finite()))
            })
            .count();

        let depth_res = median_positive_step(&prepared.depths);

        let clipped_frac = if raw_points > 0 {
            clip(clipped_points as f64 / raw_points as f64, 0.0, 1.0)
        } else {
            0.0
        };

        let quality = NULL_WEIGHT * (1.0 - null_frac)
            + CLIPPED_WEIGHT * (1.0 - clipped_frac)
            + ROWS_WEIGHT * clip(effective_rows as f64 / ROWS_SATURATION, 0.0, 1.0);

        let mut warnings = Vec::new();
        if null_frac > WARN_NULL_FRACTION {
            warnings.push("High missing-value rate may reduce reliability.".to_string());
        }
        if clipped_frac > WARN_CLIPPED_FRACTION {
            warnings.push(
                "Significant outlier clipping detected; review sensor quality.".to_string(),
            );
        }
        if effective_rows < WARN_EFFECTIVE_ROWS {
            warnings.push("Low effective row count; consider wider depth interval.".to_string());
        }
        if depth_res.is_some_and(|r| r > WARN_DEPTH_RESOLUTION) {
            warnings.push("Coarse depth sampling may miss narrow events.".to_string());
        }
        if mean_valid < WARN_MEAN_VALID {
            warnings.push(
                "Many curve samples are sparse; cross-curve agreement may be unstable."
                    .to_string(),
            );
        }
        if !excluded.is_empty() {
            warnings.push(format!(
                "Curve(s) {} excluded from detection: fewer than 30% finite samples.",
                excluded.join(", ")
            ));
        }

        DataQuality {
            null_fraction: round_to(null_frac, 4),
            null_percent: round_to(null_frac * 100.0, 2),
            effective_rows,
            depth_resolution_median: depth_res.map(|r| round_to(r, 4)),
            clipped_fraction: round_to(clipped_frac, 4),
            clipped_percent: round_to(clipped_frac * 100.0, 2),
            quality_band: QualityBand::from_score(quality),
            warnings,
            excluded_curves: excluded.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preparation::CurveSeries;

    fn prepared(n: usize, step: f64, curves: Vec<(&str, Vec<f64>)>) -> PreparedCurves {
        PreparedCurves {
            depths: (0..n).map(|i| 1000.0 + i as f64 * step).collect(),
            curves: curves
                .into_iter()
                .map(|(name, values)| CurveSeries {
                    name: name.to_string(),
                    values,
                })
                .collect(),
        }
    }

    #[test]
    fn no_curves_is_low_quality() {
        let p = prepared(10, 1.0, vec![]);
        let dq = DataQualityAssessor::assess(&p, 0, 1, &[]);
        assert_eq!(dq.null_fraction, 1.0);
        assert_eq!(dq.quality_band, QualityBand::Low);
        assert_eq!(dq.warnings, vec![NO_DATA_WARNING.to_string()]);
    }

    #[test]
    fn dense_long_log_is_high_quality() {
        let p = prepared(2500, 0.5, vec![("GR", vec![1.0; 2500])]);
        let dq = DataQualityAssessor::assess(&p, 0, 2500, &[]);
        assert_eq!(dq.quality_band, QualityBand::High);
        assert!(dq.warnings.is_empty(), "{:?}", dq.warnings);
        assert_eq!(dq.effective_rows, 2500);
        assert_eq!(dq.depth_resolution_median, Some(0.5));
    }

    #[test]
    fn warnings_appear_in_order() {
        let mut sparse = vec![f64::NAN; 50];
        sparse[0] = 1.0;
        let p = prepared(50, 5.0, vec![("GR", vec![1.0; 50]), ("RT", sparse)]);
        let excluded = vec!["RT".to_string()];
        let dq = DataQualityAssessor::assess(&p, 30, 100, &excluded);
        assert_eq!(
            dq.warnings,
            vec![
                "High missing-value rate may reduce reliability.".to_string(),
                "Significant outlier clipping detected; review sensor quality.".to_string(),
                "Low effective row count; consider wider depth interval.".to_string(),
                "Coarse depth sampling may miss narrow events.".to_string(),
                "Many curve samples are sparse; cross-curve agreement may be unstable."
                    .to_string(),
                "Curve(s) RT excluded from detection: fewer than 30% finite samples."
                    .to_string(),
            ]
        );
        assert_eq!(dq.null_fraction, 0.49);
        assert_eq!(dq.clipped_percent, 30.0);
        assert_eq!(dq.excluded_curves, excluded);
    }
}
