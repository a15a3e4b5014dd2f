//! Analysis orchestration
//!
//! `analyze` runs the full deterministic pipeline for one request:
//!
//! ```text
//! rows ─► preparation ─► detector ─► agreement ─► consolidation
//!                                                     │
//!              insight ◄─ narrative ◄─ data quality ◄─ scoring
//! ```
//!
//! Fewer than `min_rows` prepared rows short-circuit to a low-confidence
//! bundle that still carries statistics, narrative and insight. Every input
//! yields a schema-valid [`AnalysisOutput`]; numeric degeneracy is resolved
//! inside the stages, never surfaced as an error.

use tracing::{info, warn};

use crate::config::WellscanConfig;
use crate::consolidation::IntervalConsolidator;
use crate::detector::{agreement_signal, AdaptiveWindows, CurveDetector};
use crate::insight::InsightBuilder;
use crate::narrative::{
    curve_statistics, summary_bullets, summary_paragraph, NarrativeInputs,
    DEFAULT_MAX_CURVE_BULLETS,
};
use crate::preparation::PreparedCurves;
use crate::scoring::{DataQualityAssessor, GlobalScores, ScoreInputs};
use crate::stats::round_to;
use crate::types::{
    AnalysisOutput, AnalysisRequest, DataQuality, DeterministicReport, IntervalFinding,
    ThresholdDocumentation, MODEL_VERSION,
};

const INSUFFICIENT_RECOMMENDATIONS: [&str; 1] = ["Increase selected depth range."];

const INSUFFICIENT_LIMITATIONS: [&str; 2] = [
    "Too few rows for robust interpretation.",
    "Use a wider depth window.",
];

const RECOMMENDATIONS: [&str; 4] = [
    "Validate top intervals against neighboring depth windows.",
    "Prioritize intervals with higher cross-curve agreement.",
    "For noisy/spike zones, inspect sensor quality and smoothing sensitivity.",
    "Treat probability as model-based screening confidence, not final fluid confirmation.",
];

/// Stage results shared by both branches.
struct Assembled {
    findings: Vec<IntervalFinding>,
    scores: GlobalScores,
    data_quality: DataQuality,
    recommendations: Vec<String>,
    limitations: Vec<String>,
}

/// Run the deterministic analysis for one request.
///
/// The window is normalized to (shallow, deep), duplicate curve names are
/// collapsed and rows are prepared before any detection.
pub fn analyze(request: &AnalysisRequest, config: &WellscanConfig) -> AnalysisOutput {
    let window = request.depth_window();
    let curves = request.unique_curves();
    let prepared = PreparedCurves::prepare(&request.rows, &curves);
    let n = prepared.len();

    let assembled = if n < config.detection.min_rows {
        warn!(
            well = %request.well_id,
            rows = n,
            min_rows = config.detection.min_rows,
            "Too few rows for full analysis, returning low-confidence result"
        );
        insufficient(&prepared, curves.len())
    } else {
        detect(&prepared, window, config)
    };

    let curve_stats = curve_statistics(&prepared);
    let narrative = NarrativeInputs {
        from_depth: window.0,
        to_depth: window.1,
        row_count: n,
        curves: &curves,
        curve_stats: &curve_stats,
        findings: &assembled.findings,
        scores: &assembled.scores,
        data_quality: &assembled.data_quality,
    };
    let summary = summary_bullets(&narrative, DEFAULT_MAX_CURVE_BULLETS);
    let paragraph = summary_paragraph(&narrative);

    let insight = InsightBuilder::build(
        &request.well_id,
        window,
        &curves,
        &prepared,
        &assembled.findings,
        &assembled.scores,
    );

    let scores = assembled.scores;
    info!(
        well = %request.well_id,
        rows = n,
        findings = scores.event_count,
        band = %scores.severity_band,
        anomaly_score = scores.anomaly_score,
        "Analysis complete"
    );

    let deterministic = DeterministicReport {
        model_version: MODEL_VERSION.to_string(),
        event_count: scores.event_count,
        event_density_per_1000ft: round_to(scores.event_density, 3),
        anomaly_score: round_to(scores.anomaly_score, 3),
        confidence: round_to(scores.detection_confidence, 3),
        detection_confidence: round_to(scores.detection_confidence, 3),
        severity_confidence: round_to(scores.severity_confidence, 3),
        severity_band: scores.severity_band,
        data_quality: assembled.data_quality,
        curve_statistics: curve_stats,
        thresholds: ThresholdDocumentation::default(),
        summary,
        summary_paragraph: paragraph,
        interval_findings: assembled.findings,
        recommendations: assembled.recommendations,
        limitations: assembled.limitations,
    };

    AnalysisOutput {
        deterministic,
        insight,
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn insufficient(prepared: &PreparedCurves, curve_count: usize) -> Assembled {
    let raw_points = (prepared.len() * curve_count.max(1)).max(1);
    let data_quality = DataQualityAssessor::assess(prepared, 0, raw_points, &[]);

    let mut limitations = to_strings(&INSUFFICIENT_LIMITATIONS);
    limitations.extend(data_quality.warnings.iter().cloned());

    Assembled {
        findings: Vec::new(),
        scores: GlobalScores::insufficient(),
        data_quality,
        recommendations: to_strings(&INSUFFICIENT_RECOMMENDATIONS),
        limitations,
    }
}

fn detect(prepared: &PreparedCurves, window: (f64, f64), config: &WellscanConfig) -> Assembled {
    let windows = AdaptiveWindows::from_depths(&prepared.depths, &config.detection);
    let outcome = CurveDetector::detect(prepared, &windows, &config.detection);
    let agreement = agreement_signal(&outcome.masks, prepared.len());

    let findings = IntervalConsolidator::consolidate(
        &outcome.raw_intervals,
        &prepared.depths,
        &agreement,
        windows.merge_gap,
        &config.consolidation,
    );

    let curve_values: Vec<&[f64]> = prepared.curves.iter().map(|c| c.values.as_slice()).collect();
    let scores = GlobalScores::compute(&ScoreInputs {
        severity_proxies: &outcome.severity_proxies,
        agreement: &agreement,
        curves: &curve_values,
        findings: &findings,
        window,
    });

    let data_quality = DataQualityAssessor::assess(
        prepared,
        outcome.clipped_points,
        outcome.raw_points.max(1),
        &outcome.excluded_curves,
    );

    let mut limitations = vec![
        format!("Model version: {MODEL_VERSION}"),
        format!("Event count: {}", findings.len()),
        "Confidence and severity scores are model-based and require domain validation."
            .to_string(),
    ];
    limitations.extend(data_quality.warnings.iter().cloned());

    Assembled {
        findings,
        scores,
        data_quality,
        recommendations: to_strings(&RECOMMENDATIONS),
        limitations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogRow, SeverityBand};

    fn request(n: usize, curves: &[&str]) -> AnalysisRequest {
        let rows = (0..n)
            .map(|i| {
                let d = 1000.0 + i as f64;
                curves.iter().fold(LogRow::new(d), |row, c| {
                    row.with(c, Some(50.0 + (i as f64 * 0.37).sin()))
                })
            })
            .collect();
        AnalysisRequest {
            well_id: "W-1".into(),
            from_depth: 1000.0 + n as f64,
            to_depth: 1000.0,
            curves: curves.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn short_request_takes_insufficient_branch() {
        let out = analyze(&request(10, &["GR"]), &WellscanConfig::default());
        let det = &out.deterministic;
        assert_eq!(det.event_count, 0);
        assert_eq!(det.anomaly_score, 0.0);
        assert_eq!(det.detection_confidence, 0.25);
        assert_eq!(det.severity_confidence, 0.2);
        assert_eq!(det.severity_band, SeverityBand::Low);
        assert_eq!(det.recommendations, vec!["Increase selected depth range."]);
        assert_eq!(det.limitations[0], "Too few rows for robust interpretation.");
        assert!(det.summary.len() >= 7);
        assert_eq!(out.insight.zones.len(), 4);
    }

    #[test]
    fn normal_branch_documents_model() {
        let out = analyze(&request(200, &["GR", "RHOB"]), &WellscanConfig::default());
        let det = &out.deterministic;
        assert_eq!(det.model_version, MODEL_VERSION);
        assert_eq!(det.limitations[0], "Model version: det-v4");
        assert_eq!(det.limitations[1], format!("Event count: {}", det.event_count));
        assert_eq!(det.recommendations.len(), 4);
        assert_eq!(det.confidence, det.detection_confidence);
        assert_eq!(det.curve_statistics.len(), 2);
        assert_eq!(out.insight.from_depth, 1000.0);
        assert_eq!(out.insight.to_depth, 1200.0);
    }

    #[test]
    fn empty_request_is_still_schema_valid() {
        let req = AnalysisRequest {
            well_id: "EMPTY".into(),
            from_depth: 0.0,
            to_depth: 0.0,
            curves: Vec::new(),
            rows: Vec::new(),
        };
        let out = analyze(&req, &WellscanConfig::default());
        assert_eq!(out.deterministic.data_quality.effective_rows, 0);
        assert!(serde_json::to_value(&out).is_ok());
    }
}
