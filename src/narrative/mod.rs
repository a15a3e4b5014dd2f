//! Curve Statistics & Narrative Builder
//!
//! Turns the numeric outcome of an analysis into human-readable text:
//!
//! - **Curve statistics**: min/max/mean/std/p10/p90, trend, ±2σ outliers and
//!   usable ratio per requested curve
//! - **Summary bullets**: scope, finding count and density, global scores,
//!   strongest finding, up to two dominant-curve lines, data quality and a
//!   fixed caution line; padded with filler to 7 bullets, capped at 8
//! - **Summary paragraph**: four sentences covering scope, global risk, the
//!   strongest finding (or its absence) and the dominant curve or data quality
//!
//! Dominant curves are ranked by finite sample count, then p90 - p10 spread,
//! with ties kept in caller order.

pub mod hints;

use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::preparation::PreparedCurves;
use crate::scoring::GlobalScores;
use crate::stats::{curve_trend, percentile_sorted, round_to, EPS};
use crate::types::{CurveStatistics, CurveStatisticsMap, DataQuality, IntervalFinding};

pub use hints::{curve_family, curve_interpretation, curve_tag, CurveFamily};

// ============================================================================
// Constants
// ============================================================================

/// Target bullet count range.
const MIN_BULLETS: usize = 7;
const MAX_BULLETS: usize = 8;

/// Bullets reserved for the data-quality and caution lines.
const TRAILING_BULLETS: usize = 2;

/// Default cap on per-curve bullet lines.
pub const DEFAULT_MAX_CURVE_BULLETS: usize = 4;

/// Outlier band in standard deviations.
const OUTLIER_SIGMA: f64 = 2.0;

const CAUTION_LINE: &str = "Interpretation is screening-level and should be validated with \
    offset wells, additional logs, and domain review before operational decisions.";

const FILLER_LINES: [&str; 2] = [
    "Cross-validate flagged zones with adjacent intervals and companion logs.",
    "Use these results as screening evidence and confirm with domain review before action.",
];

const LIMITED_EVIDENCE_LINE: &str =
    "Evidence is limited; expand interval or add curves to improve confidence.";

// ============================================================================
// Curve statistics
// ============================================================================

/// Format an optional number with fixed decimals, `n/a` when missing.
pub fn fmt_opt(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", digits, v),
        _ => "n/a".to_string(),
    }
}

fn fmt_num(value: f64, digits: usize) -> String {
    fmt_opt(Some(value), digits)
}

/// Shortest round-trip rendering; integral values keep a trailing `.0`.
pub fn float_repr(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Descriptive statistics of one curve over its finite samples.
pub fn describe_curve(values: &[f64]) -> CurveStatistics {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let count = finite.len();
    if count == 0 {
        return CurveStatistics::empty();
    }

    let mean = finite.iter().mean();
    let std = if count > 1 { finite.iter().std_dev() } else { 0.0 };
    let mut sorted = finite.clone();
    sorted.sort_by(f64::total_cmp);

    let outlier_count = if count < 3 || !std.is_finite() || std < EPS {
        0
    } else {
        let hi = mean + OUTLIER_SIGMA * std;
        let lo = mean - OUTLIER_SIGMA * std;
        finite.iter().filter(|v| **v > hi || **v < lo).count()
    };

    CurveStatistics {
        min: Some(round_to(sorted[0], 4)),
        max: Some(round_to(sorted[count - 1], 4)),
        mean: Some(round_to(mean, 4)),
        std: Some(round_to(std, 4)),
        count,
        p10: Some(round_to(percentile_sorted(&sorted, 10.0), 4)),
        p90: Some(round_to(percentile_sorted(&sorted, 90.0), 4)),
        trend: curve_trend(&finite),
        outlier_count,
        outlier_pct: round_to(100.0 * outlier_count as f64 / count as f64, 2),
        usable_ratio: round_to(count as f64 / values.len().max(1) as f64, 4),
    }
}

/// Statistics for every prepared curve, in prepared curve order.
pub fn curve_statistics(prepared: &PreparedCurves) -> CurveStatisticsMap {
    prepared
        .curves
        .iter()
        .map(|c| (c.name.clone(), describe_curve(&c.values)))
        .collect()
}

/// Up to `max_items` curves ranked by (count, spread) descending.
///
/// Curves without statistics are skipped. Ties keep the order of `curves`.
pub fn top_curves(
    curves: &[String],
    stats: &CurveStatisticsMap,
    max_items: usize,
) -> Vec<String> {
    let mut scored: Vec<(&String, usize, f64)> = curves
        .iter()
        .filter_map(|c| {
            stats
                .get(c)
                .map(|s| (c, s.count, s.spread().unwrap_or(f64::NEG_INFINITY)))
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.2.total_cmp(&a.2)));
    scored
        .into_iter()
        .take(max_items)
        .map(|(c, _, _)| c.clone())
        .collect()
}

// ============================================================================
// Narrative
// ============================================================================

/// Everything the narrative builders read.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInputs<'a> {
    pub from_depth: f64,
    pub to_depth: f64,
    pub row_count: usize,
    /// Requested curves in caller order
    pub curves: &'a [String],
    pub curve_stats: &'a CurveStatisticsMap,
    /// Final findings, strongest first
    pub findings: &'a [IntervalFinding],
    pub scores: &'a GlobalScores,
    pub data_quality: &'a DataQuality,
}

impl NarrativeInputs<'_> {
    fn window(&self) -> (f64, f64) {
        (
            self.from_depth.min(self.to_depth),
            self.from_depth.max(self.to_depth),
        )
    }
}

fn reason_breakdown(findings: &[IntervalFinding]) -> String {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for f in findings {
        *counts.entry(f.reason.as_str()).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn curve_line(name: &str, s: &CurveStatistics) -> String {
    format!(
        "{name}: min={}, max={}, mean={}, std={}, p10={}, p90={}, trend={}, outliers={} ({}%). {}",
        fmt_opt(s.min, 2),
        fmt_opt(s.max, 2),
        fmt_opt(s.mean, 2),
        fmt_opt(s.std, 2),
        fmt_opt(s.p10, 2),
        fmt_opt(s.p90, 2),
        s.trend,
        s.outlier_count,
        fmt_num(s.outlier_pct, 1),
        curve_interpretation(name, s),
    )
}

/// Bounded bullet list (7 to 8 entries).
pub fn summary_bullets(inputs: &NarrativeInputs<'_>, max_curve_bullets: usize) -> Vec<String> {
    let (lo, hi) = inputs.window();
    let width = (hi - lo).max(0.0);
    let scores = inputs.scores;

    let top_text = match inputs.findings.first() {
        Some(top) => format!(
            "Top interval is {:.1}-{:.1} ft ({}) with score={} and confidence={}.",
            top.from_depth,
            top.to_depth,
            top.curve,
            fmt_num(top.score, 2),
            fmt_num(top.confidence, 2),
        ),
        None => "No localized anomaly interval survived consolidation in the selected range."
            .to_string(),
    };

    let mut out = vec![
        format!(
            "Analyzed {} rows over {lo:.1}-{hi:.1} ft ({width:.1} ft) across {} curve(s).",
            inputs.row_count,
            inputs.curves.len(),
        ),
        format!(
            "Detected {} consolidated anomalous interval(s) (density={} per 1000 ft; types={}).",
            inputs.findings.len(),
            fmt_num(scores.event_density, 3),
            reason_breakdown(inputs.findings),
        ),
        format!(
            "Global risk is {} with anomalyScore={}, detectionConfidence={}, severityConfidence={}.",
            scores.severity_band,
            fmt_num(scores.anomaly_score, 3),
            fmt_num(scores.detection_confidence, 3),
            fmt_num(scores.severity_confidence, 3),
        ),
        top_text,
    ];

    let capacity = MAX_BULLETS.saturating_sub(out.len() + TRAILING_BULLETS);
    let selected = top_curves(
        inputs.curves,
        inputs.curve_stats,
        max_curve_bullets.min(capacity),
    );
    for name in &selected {
        if let Some(s) = inputs.curve_stats.get(name).filter(|s| s.count > 0) {
            out.push(curve_line(name, s));
        }
    }

    let dq = inputs.data_quality;
    out.push(format!(
        "Data quality is {}: null={}%, clipped={}%, effectiveRows={}.",
        dq.quality_band,
        fmt_num(dq.null_percent, 1),
        fmt_num(dq.clipped_percent, 1),
        dq.effective_rows,
    ));
    out.push(CAUTION_LINE.to_string());

    let mut filler = FILLER_LINES.iter();
    while out.len() < MIN_BULLETS {
        out.push(filler.next().unwrap_or(&LIMITED_EVIDENCE_LINE).to_string());
    }
    out.truncate(MAX_BULLETS);
    out
}

/// Four-sentence summary paragraph.
pub fn summary_paragraph(inputs: &NarrativeInputs<'_>) -> String {
    let (lo, hi) = inputs.window();
    let scores = inputs.scores;
    let dq = inputs.data_quality;

    let s1 = format!(
        "Interpretation covered {lo:.1}-{hi:.1} ft using {} rows across {} selected curve(s).",
        inputs.row_count,
        inputs.curves.len(),
    );
    let s2 = format!(
        "Global risk is {} with anomaly score {} and detection confidence {}.",
        scores.severity_band,
        fmt_num(scores.anomaly_score, 3),
        fmt_num(scores.detection_confidence, 3),
    );
    let s3 = match inputs.findings.first() {
        Some(top) => format!(
            "The strongest localized interval is {:.1}-{:.1} ft on {}, scored {}.",
            top.from_depth,
            top.to_depth,
            top.curve,
            fmt_num(top.score, 2),
        ),
        None => "No consolidated localized interval was retained, so the result is driven by \
                 global behavior."
            .to_string(),
    };

    let dominant = top_curves(inputs.curves, inputs.curve_stats, 1)
        .into_iter()
        .next()
        .and_then(|name| {
            inputs
                .curve_stats
                .get(&name)
                .filter(|s| s.count > 0)
                .map(|s| (name, s))
        });
    let s4 = match dominant {
        Some((name, s)) => format!(
            "Dominant curve {name} has mean {} and trend {}; data quality is {} (null {}%).",
            fmt_opt(s.mean, 2),
            s.trend,
            dq.quality_band,
            fmt_num(dq.null_percent, 1),
        ),
        None => format!(
            "Data quality is {} (null {}%, clipped {}%).",
            dq.quality_band,
            fmt_num(dq.null_percent, 1),
            fmt_num(dq.clipped_percent, 1),
        ),
    };

    [s1, s2, s3, s4].join(" ")
}
