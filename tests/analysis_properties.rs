//! Analysis Property Tests
//!
//! Drives `wellscan::analyze` through its public API and checks the
//! guarantees every caller relies on: bounded scores, non-overlapping and
//! separated findings, determinism, order independence, the insufficient-data
//! boundary and sparse-curve handling.

use wellscan::consolidation::interval_iou;
use wellscan::detector::{contiguous_runs, AdaptiveWindows, CurveDetector};
use wellscan::insight::InsightBuilder;
use wellscan::preparation::{CurveSeries, PreparedCurves};
use wellscan::scoring::GlobalScores;
use wellscan::types::{IntervalShape, Probability, QualityBand, SeverityBand};
use wellscan::{analyze, AnalysisOutput, AnalysisRequest, LogRow, WellscanConfig};

// ============================================================================
// Fixtures
// ============================================================================

/// Small deterministic wiggle so MAD-based scales never degenerate.
fn wiggle(i: usize) -> f64 {
    let sign = if i % 2 == 0 { 0.5 } else { -0.5 };
    sign + 0.3 * (i as f64 * 0.7).sin()
}

fn request(depths: &[f64], curves: &[(&str, Vec<Option<f64>>)]) -> AnalysisRequest {
    let rows = depths
        .iter()
        .enumerate()
        .map(|(i, d)| {
            curves
                .iter()
                .fold(LogRow::new(*d), |row, (name, values)| row.with(name, values[i]))
        })
        .collect();
    AnalysisRequest {
        well_id: "PROP-1".into(),
        from_depth: depths.first().copied().unwrap_or(0.0),
        to_depth: depths.last().copied().unwrap_or(0.0),
        curves: curves.iter().map(|(n, _)| n.to_string()).collect(),
        rows,
    }
}

fn spike_depths() -> Vec<f64> {
    (0..80).map(|i| 1000.0 + 1.25 * i as f64).collect()
}

/// 80 samples over 1000-1100 at 1.25 spacing with a flat-topped +30 block
/// on samples 35..45, far above the +/-0.8 noise floor.
fn block_request() -> AnalysisRequest {
    let gr: Vec<Option<f64>> = (0..80)
        .map(|i| {
            let base = 60.0 + wiggle(i);
            Some(if (35..45).contains(&i) { base + 30.0 } else { base })
        })
        .collect();
    request(&spike_depths(), &[("GR", gr)])
}

/// Same grid with a needle at 1050 standing on +40 shoulders two samples wide.
fn needle_request() -> AnalysisRequest {
    let gr: Vec<Option<f64>> = (0..80)
        .map(|i| Some(60.0 + wiggle(i) + pulse(i, 40, 40.0)))
        .collect();
    request(&spike_depths(), &[("GR", gr)])
}

/// `2h` at `center`, `h` within two samples of it, zero elsewhere.
fn pulse(i: usize, center: usize, h: f64) -> f64 {
    match i.abs_diff(center) {
        0 => 2.0 * h,
        1..=2 => h,
        _ => 0.0,
    }
}

/// Two curves over 2000-2299 at 1.0 spacing with three co-located pulses,
/// RHOB offset two samples below GR.
fn busy_request() -> AnalysisRequest {
    let depths: Vec<f64> = (0..300).map(|i| 2000.0 + i as f64).collect();
    let pulses = |i: usize, centers: [usize; 3], h: f64| {
        centers.iter().map(|c| pulse(i, *c, h)).sum::<f64>()
    };
    let gr = (0..300)
        .map(|i| Some(80.0 + wiggle(i) + pulses(i, [60, 150, 240], 40.0)))
        .collect();
    let rhob = (0..300)
        .map(|i| Some(2.4 + 0.01 * wiggle(i) + pulses(i, [62, 152, 242], 0.4)))
        .collect();
    request(&depths, &[("GR", gr), ("RHOB", rhob)])
}

fn to_json(output: &AnalysisOutput) -> String {
    serde_json::to_string(output).unwrap()
}

fn assert_score_ranges(output: &AnalysisOutput) {
    let det = &output.deterministic;
    for v in [det.anomaly_score, det.detection_confidence, det.severity_confidence] {
        assert!((0.0..=1.0).contains(&v), "score out of range: {v}");
    }
    if det.event_count == 0 {
        assert!(det.anomaly_score <= 0.49);
        assert!(det.severity_confidence <= 0.55);
    }
    assert!(!det.recommendations.is_empty());
    assert!(!det.limitations.is_empty());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn findings_are_deduplicated_and_separated() {
    let output = analyze(&busy_request(), &WellscanConfig::default());
    let findings = &output.deterministic.interval_findings;
    assert!(findings.len() >= 2, "expected several findings: {findings:?}");
    for (i, a) in findings.iter().enumerate() {
        for b in &findings[i + 1..] {
            let iou = interval_iou(a.from_depth, a.to_depth, b.from_depth, b.to_depth);
            assert!(iou < 0.55, "overlapping findings: {a:?} / {b:?}");
            assert!(
                (a.center() - b.center()).abs() >= 22.0,
                "findings too close: {} vs {}",
                a.center(),
                b.center()
            );
        }
    }
    // Offset pulses on both curves merge into shared findings.
    assert!(findings.iter().all(|f| f.curve == "GR,RHOB" && f.curves_supporting == 2));
    assert_eq!(output.deterministic.event_count, findings.len());
    assert_score_ranges(&output);
}

#[test]
fn identical_input_gives_identical_output() {
    let config = WellscanConfig::default();
    let req = busy_request();
    let first = analyze(&req, &config);
    assert!(first.deterministic.event_count >= 2);
    assert_eq!(to_json(&first), to_json(&analyze(&req, &config)));
}

#[test]
fn row_order_does_not_matter() {
    let config = WellscanConfig::default();
    let sorted = busy_request();
    let mut shuffled = sorted.clone();
    shuffled.rows.reverse();
    shuffled.rows.swap(3, 200);
    let expected = analyze(&sorted, &config);
    assert!(expected.deterministic.event_count >= 2);
    assert_eq!(to_json(&expected), to_json(&analyze(&shuffled, &config)));
}

#[test]
fn nineteen_rows_take_the_insufficient_branch() {
    let depths: Vec<f64> = (0..19).map(|i| 500.0 + i as f64).collect();
    let gr = (0..19).map(|i| Some(40.0 + wiggle(i))).collect();
    let output = analyze(&request(&depths, &[("GR", gr)]), &WellscanConfig::default());
    let det = &output.deterministic;
    assert_eq!(det.limitations[0], "Too few rows for robust interpretation.");
    assert_eq!(det.recommendations, vec!["Increase selected depth range."]);
    assert_eq!(det.event_count, 0);
    assert_eq!(det.severity_band, SeverityBand::Low);
    assert_score_ranges(&output);
}

#[test]
fn twenty_quiet_rows_report_no_events() {
    let depths: Vec<f64> = (0..20).map(|i| 500.0 + i as f64).collect();
    let flat = vec![Some(40.0); 20];
    let output = analyze(&request(&depths, &[("GR", flat)]), &WellscanConfig::default());
    let det = &output.deterministic;
    assert_eq!(det.limitations[0], "Model version: det-v4");
    assert_eq!(det.event_count, 0);
    assert!(matches!(det.severity_band, SeverityBand::Low | SeverityBand::Moderate));
    assert_score_ranges(&output);
}

#[test]
fn sparse_and_missing_curves_are_excluded_not_fatal() {
    let depths: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
    let gr = (0..60).map(|i| Some(70.0 + wiggle(i))).collect();
    let sparse = (0..60).map(|i| if i % 10 == 0 { Some(1.0) } else { None }).collect();
    let missing = vec![None; 60];
    let output = analyze(
        &request(&depths, &[("GR", gr), ("NPHI", sparse), ("DT", missing)]),
        &WellscanConfig::default(),
    );
    let dq = &output.deterministic.data_quality;
    assert_eq!(dq.excluded_curves, vec!["NPHI".to_string(), "DT".to_string()]);
    assert!(dq
        .warnings
        .iter()
        .any(|w| w == "Curve(s) NPHI, DT excluded from detection: fewer than 30% finite samples."));
    assert!(dq.null_fraction > 0.35);
    assert_ne!(dq.quality_band, QualityBand::High);
    let stats = &output.deterministic.curve_statistics;
    assert_eq!(stats.get("DT").map(|s| s.count), Some(0));
    let order: Vec<&str> = stats.iter().map(|(n, _)| n).collect();
    assert_eq!(order, vec!["GR", "NPHI", "DT"]);
    assert_score_ranges(&output);
}

#[test]
fn flat_topped_block_flags_only_its_edges() {
    let req = block_request();
    let config = WellscanConfig::default();
    let depths = spike_depths();
    let windows = AdaptiveWindows::from_depths(&depths, &config.detection);
    assert_eq!(windows.min_run, 5);

    let values: Vec<f64> = req
        .rows
        .iter()
        .map(|r| r.values["GR"].unwrap_or(f64::NAN))
        .collect();
    let scored = CurveDetector::score_curve(&values, &depths, &windows, &config.detection);
    let runs = contiguous_runs(&scored.mask);
    assert!(!runs.is_empty());
    for (i, j) in &runs {
        assert!((32..=47).contains(i) && (32..=47).contains(j), "run off the block: {i}..{j}");
        assert!(j - i + 1 < windows.min_run, "run {i}..{j} reaches min_run");
    }
    // The block interior tracks its own rolling mean, so no run survives.
    assert!(!scored.mask[40]);

    let output = analyze(&req, &config);
    assert_eq!(output.deterministic.event_count, 0);
    assert_eq!(output.insight.to_depth, 1098.75);
    assert_score_ranges(&output);
}

#[test]
fn needle_is_bracketed_by_one_spike_finding() {
    let output = analyze(&needle_request(), &WellscanConfig::default());
    let det = &output.deterministic;
    assert_eq!(det.event_count, 1, "findings: {:?}", det.interval_findings);
    let hit = &det.interval_findings[0];
    assert_eq!(hit.reason, IntervalShape::Spike);
    assert_ne!(hit.probability, Probability::Low);
    assert!(hit.from_depth <= 1050.0 && hit.to_depth >= 1050.0, "{hit:?}");
    assert_eq!(hit.curve, "GR");
    assert_score_ranges(&output);
}

// ============================================================================
// Insight indices
// ============================================================================

fn prepared(depths: &[f64], a: Vec<f64>, b: Vec<f64>) -> PreparedCurves {
    PreparedCurves {
        depths: depths.to_vec(),
        curves: vec![
            CurveSeries {
                name: "GR".into(),
                values: a,
            },
            CurveSeries {
                name: "RHOB".into(),
                values: b,
            },
        ],
    }
}

#[test]
fn correlated_curves_raise_wetness() {
    let depths: Vec<f64> = (0..120).map(|i| 1000.0 + i as f64).collect();
    let base: Vec<f64> = (0..120).map(|i| 50.0 + 10.0 * (i as f64 * 0.2).sin()).collect();
    let correlated: Vec<f64> = base
        .iter()
        .enumerate()
        .map(|(i, v)| 0.5 * v + 2.0 * (i as f64 * 1.3).cos())
        .collect();
    let uncorrelated: Vec<f64> = (0..120).map(|i| 25.0 + 5.0 * (i as f64 * 0.2).cos()).collect();

    let scores = GlobalScores {
        anomaly_score: 0.4,
        detection_confidence: 0.6,
        severity_confidence: 0.5,
        severity_band: SeverityBand::Moderate,
        event_count: 1,
        event_density: 8.3,
    };
    let curves = vec!["GR".to_string(), "RHOB".to_string()];
    let window = (1000.0, 1119.0);

    let high = InsightBuilder::build(
        "W",
        window,
        &curves,
        &prepared(&depths, base.clone(), correlated),
        &[],
        &scores,
    );
    let low = InsightBuilder::build(
        "W",
        window,
        &curves,
        &prepared(&depths, base, uncorrelated),
        &[],
        &scores,
    );
    assert!(high.indices.wetness_index > low.indices.wetness_index);
}
