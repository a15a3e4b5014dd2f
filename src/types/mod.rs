//! Shared data structures for depth-indexed well-log screening
//!
//! This module defines the types flowing through the analysis pipeline:
//! - Request: `AnalysisRequest` / `LogRow` (caller-supplied rows)
//! - Detection: `IntervalShape`, `IntervalFinding` (consolidated findings)
//! - Report: `DeterministicReport`, `DataQuality`, `CurveStatistics`, `CurveStatisticsMap`
//! - Insight: `Insight` (derived indices, fluid label, risk, zones)
//!
//! Every output struct serializes to the camelCase JSON wire format.

mod request;
mod findings;
mod report;
mod insight;

pub use request::*;
pub use findings::*;
pub use report::*;
pub use insight::*;

use serde::{Deserialize, Serialize};

/// Model version stamped on every deterministic report.
pub const MODEL_VERSION: &str = "det-v4";

/// Both output bundles of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub deterministic: DeterministicReport,
    pub insight: Insight,
}

/// Envelope printed by the `interpret` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretEnvelope {
    pub ok: bool,
    pub deterministic: DeterministicReport,
    pub insight: Insight,
}

impl From<AnalysisOutput> for InterpretEnvelope {
    fn from(output: AnalysisOutput) -> Self {
        Self {
            ok: true,
            deterministic: output.deterministic,
            insight: output.insight,
        }
    }
}
