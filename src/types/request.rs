//! Caller-supplied analysis request

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One depth sample: depth plus an optional value per curve.
///
/// A missing key and an explicit `null` both mean "no measurement";
/// neither is treated as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub depth: f64,
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl LogRow {
    pub fn new(depth: f64) -> Self {
        Self {
            depth,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style helper used by callers assembling rows in code.
    #[must_use]
    pub fn with(mut self, curve: &str, value: Option<f64>) -> Self {
        self.values.insert(curve.to_string(), value);
        self
    }

    /// Value for `curve`, `None` when absent, null, or non-finite.
    pub fn value(&self, curve: &str) -> Option<f64> {
        self.values
            .get(curve)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}

/// Interpretation request for one well and depth window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub well_id: String,
    pub from_depth: f64,
    pub to_depth: f64,
    pub curves: Vec<String>,
    pub rows: Vec<LogRow>,
}

impl AnalysisRequest {
    /// Depth window ordered as (shallow, deep) regardless of input order.
    pub fn depth_window(&self) -> (f64, f64) {
        (
            self.from_depth.min(self.to_depth),
            self.from_depth.max(self.to_depth),
        )
    }

    /// Curve names with duplicates collapsed, first occurrence wins.
    pub fn unique_curves(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.curves.len());
        for c in &self.curves {
            if !out.contains(c) {
                out.push(c.clone());
            }
        }
        out
    }
}
