//! Curve Preparation
//!
//! Turns caller rows into a canonical depth grid with one aligned sample
//! array per curve:
//!
//! 1. Rows with a non-finite depth are dropped.
//! 2. Remaining rows are stable-sorted by depth.
//! 3. A row is kept only if its depth strictly exceeds the last kept depth,
//!    so the first occurrence of a duplicated depth wins.
//! 4. Each requested curve becomes a `Vec<f64>` with NaN marking missing
//!    samples (absent key, `null`, or a non-finite value).
//!
//! Rows outside the requested window are kept; the window only scopes
//! density, zones and narrative text.

use tracing::debug;

use crate::types::{AnalysisRequest, LogRow};

/// One curve aligned 1:1 with the depth series.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Strictly increasing depth series plus aligned curves in caller order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedCurves {
    pub depths: Vec<f64>,
    pub curves: Vec<CurveSeries>,
}

impl PreparedCurves {
    /// Prepare the rows and curve list of a request.
    pub fn from_request(request: &AnalysisRequest) -> Self {
        Self::prepare(&request.rows, &request.unique_curves())
    }

    /// Sort, de-duplicate and align `rows` for `curve_names`.
    pub fn prepare(rows: &[LogRow], curve_names: &[String]) -> Self {
        let mut ordered: Vec<&LogRow> = rows.iter().filter(|r| r.depth.is_finite()).collect();
        ordered.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        let mut kept: Vec<&LogRow> = Vec::with_capacity(ordered.len());
        for row in ordered {
            if kept.last().map_or(true, |last| row.depth > last.depth) {
                kept.push(row);
            }
        }

        let depths: Vec<f64> = kept.iter().map(|r| r.depth).collect();
        let curves = curve_names
            .iter()
            .map(|name| CurveSeries {
                name: name.clone(),
                values: kept
                    .iter()
                    .map(|r| r.value(name).unwrap_or(f64::NAN))
                    .collect(),
            })
            .collect();

        debug!(
            input_rows = rows.len(),
            kept_rows = depths.len(),
            curves = curve_names.len(),
            "Prepared depth grid"
        );

        Self { depths, curves }
    }

    /// Number of depth samples.
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Curve names in caller order.
    pub fn names(&self) -> Vec<String> {
        self.curves.iter().map(|c| c.name.clone()).collect()
    }

    /// Aligned samples of a curve, if requested.
    pub fn curve(&self, name: &str) -> Option<&[f64]> {
        self.curves
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }
}
