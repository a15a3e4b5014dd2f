//! Confidence & Severity Aggregator
//!
//! Collapses per-curve severity proxies, the agreement signal and the kept
//! findings into the global scores of the deterministic report:
//!
//! - `anomaly_score = clip(0.78 * mean(proxies) + 0.22 * mean(agreement), 0, 1)`
//! - `detection_confidence = clip(0.40 * dq + 0.30 * interval + 0.30 * agreement, 0.25, 0.95)`
//! - `severity_confidence = clip(0.55 * anomaly + 0.45 * strength, 0.20, 0.92)`
//!
//! Consistency guard: with zero findings the anomaly score is capped at
//! 0.49 and severity confidence at 0.55. The severity band is derived after
//! the guard, so an empty finding list never reports HIGH or CRITICAL.

pub mod data_quality;

pub use data_quality::DataQualityAssessor;

use crate::stats::{clip, finite_fraction};
use crate::types::{IntervalFinding, SeverityBand};

// ============================================================================
// Constants
// ============================================================================

const ANOMALY_PROXY_WEIGHT: f64 = 0.78;
const ANOMALY_AGREEMENT_WEIGHT: f64 = 0.22;

const DETECTION_DQ_WEIGHT: f64 = 0.40;
const DETECTION_INTERVAL_WEIGHT: f64 = 0.30;
const DETECTION_AGREEMENT_WEIGHT: f64 = 0.30;
const DETECTION_MIN: f64 = 0.25;
const DETECTION_MAX: f64 = 0.95;

const SEVERITY_ANOMALY_WEIGHT: f64 = 0.55;
const SEVERITY_STRENGTH_WEIGHT: f64 = 0.45;
const SEVERITY_MIN: f64 = 0.20;
const SEVERITY_MAX: f64 = 0.92;

/// Interval width (depth units) at which the interval term saturates.
const INTERVAL_WIDTH_SATURATION: f64 = 20.0;

/// Finding score at which the strength term saturates.
const STRENGTH_SCORE_SATURATION: f64 = 6.0;

/// Interval and strength terms used when nothing survived consolidation.
const EMPTY_TERM_DEFAULT: f64 = 0.2;

/// Zero-findings caps.
pub const GUARD_ANOMALY_CAP: f64 = 0.49;
pub const GUARD_SEVERITY_CAP: f64 = 0.55;

/// Global scores of one analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalScores {
    pub anomaly_score: f64,
    pub detection_confidence: f64,
    pub severity_confidence: f64,
    pub severity_band: SeverityBand,
    pub event_count: usize,
    /// Findings per 1000 depth units of the requested window
    pub event_density: f64,
}

/// Inputs of [`GlobalScores::compute`].
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub severity_proxies: &'a [f64],
    pub agreement: &'a [f64],
    /// Aligned sample arrays of every requested curve
    pub curves: &'a [&'a [f64]],
    pub findings: &'a [IntervalFinding],
    pub window: (f64, f64),
}

fn mean_or(values: impl Iterator<Item = f64>, default: f64) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        default
    } else {
        sum / count as f64
    }
}

/// Findings per 1000 depth units.
pub fn event_density(event_count: usize, window: (f64, f64)) -> f64 {
    let width = (window.1 - window.0).max(1e-9);
    event_count as f64 / (width / 1000.0)
}

impl GlobalScores {
    pub fn compute(inputs: &ScoreInputs<'_>) -> Self {
        let base = mean_or(inputs.severity_proxies.iter().copied(), 0.0);
        let agree_global = mean_or(inputs.agreement.iter().copied(), 0.0);
        let anomaly = clip(
            ANOMALY_PROXY_WEIGHT * base + ANOMALY_AGREEMENT_WEIGHT * agree_global,
            0.0,
            1.0,
        );

        let dq_scalar = mean_or(inputs.curves.iter().map(|c| finite_fraction(c)), 0.0);
        let interval_term = mean_or(
            inputs.findings.iter().map(|f| {
                let width = f.to_depth - f.from_depth;
                let width = if width.is_finite() { width } else { 0.0 };
                (width / INTERVAL_WIDTH_SATURATION).min(1.0)
            }),
            EMPTY_TERM_DEFAULT,
        );
        let strength = mean_or(
            inputs.findings.iter().map(|f| {
                let s = if f.score.is_finite() { f.score } else { 0.0 };
                (s / STRENGTH_SCORE_SATURATION).min(1.0)
            }),
            EMPTY_TERM_DEFAULT,
        );

        let detection = clip(
            DETECTION_DQ_WEIGHT * dq_scalar
                + DETECTION_INTERVAL_WEIGHT * interval_term
                + DETECTION_AGREEMENT_WEIGHT * agree_global,
            DETECTION_MIN,
            DETECTION_MAX,
        );
        let severity = clip(
            SEVERITY_ANOMALY_WEIGHT * anomaly + SEVERITY_STRENGTH_WEIGHT * strength,
            SEVERITY_MIN,
            SEVERITY_MAX,
        );

        let event_count = inputs.findings.len();
        Self::guarded(
            anomaly,
            detection,
            severity,
            event_count,
            event_density(event_count, inputs.window),
        )
    }

    /// Low-confidence scores for the insufficient-data branch.
    pub fn insufficient() -> Self {
        Self::guarded(0.0, DETECTION_MIN, SEVERITY_MIN, 0, 0.0)
    }

    /// Apply the zero-findings guard, then band.
    fn guarded(
        mut anomaly: f64,
        detection: f64,
        mut severity: f64,
        event_count: usize,
        event_density: f64,
    ) -> Self {
        if event_count == 0 {
            anomaly = anomaly.min(GUARD_ANOMALY_CAP);
            severity = severity.min(GUARD_SEVERITY_CAP);
        }
        Self {
            anomaly_score: anomaly,
            detection_confidence: detection,
            severity_confidence: severity,
            severity_band: SeverityBand::from_score(anomaly),
            event_count,
            event_density,
        }
    }
}
