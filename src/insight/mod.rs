//! Insight Synthesizer
//!
//! Derives the compact insight bundle from the first two selected curves
//! (caller order is the pairing policy) and the global scores:
//!
//! - wetness  = clip(0.45 * anomaly + 0.35 * max(r12, 0) + 0.20 * severity, 0, 1)
//! - balance  = (mean1 + eps) / (mean2 + eps), when both means are finite
//! - character = clip(|slope2| / (|slope1| + eps), 0, 5), when both curves exist
//!
//! Plus a heuristic fluid label, the top findings as shows, a seal and
//! saturation risk profile, and four equal-width zones labeled by how many
//! findings overlap them.

use tracing::debug;

use crate::narrative::{curve_family, float_repr};
use crate::preparation::PreparedCurves;
use crate::scoring::GlobalScores;
use crate::stats::{clip, curve_trend, linear_slope, nanmean, round_to, safe_corr, EPS};
use crate::types::{
    FluidLabel, Insight, InsightIndices, InsightZone, IntervalFinding, PrimaryFluid, RiskLevel,
    RiskProfile, Show, Trend, ZoneLabel,
};

// ============================================================================
// Constants
// ============================================================================

const MAX_SHOWS: usize = 6;
const MAX_EVIDENCE: usize = 5;
const ZONE_COUNT: usize = 4;

/// |r12| beyond which the wetness text mentions the curve correlation.
const STRONG_CORRELATION: f64 = 0.5;

/// One selected curve's summary for the pairwise indices.
struct CurveSummary<'a> {
    name: &'a str,
    values: &'a [f64],
    mean: f64,
    slope: f64,
}

impl<'a> CurveSummary<'a> {
    fn new(name: &'a str, values: &'a [f64], depths: &[f64]) -> Self {
        let (mean, slope) = if values.is_empty() {
            (f64::NAN, 0.0)
        } else {
            (nanmean(values), linear_slope(depths, values))
        };
        Self {
            name,
            values,
            mean,
            slope,
        }
    }

    fn trend(&self) -> Trend {
        let finite: Vec<f64> = self.values.iter().copied().filter(|v| v.is_finite()).collect();
        curve_trend(&finite)
    }
}

// ============================================================================
// Index texts
// ============================================================================

fn wetness_text(wh: f64, corr: f64) -> String {
    let base = if wh >= 0.75 {
        "high likelihood of hydrocarbon-related activity"
    } else if wh >= 0.50 {
        "moderate hydrocarbon indication"
    } else {
        "low-to-moderate hydrocarbon indication"
    };
    if corr >= STRONG_CORRELATION {
        format!("{base}, supported by strong positive curve correlation")
    } else if corr <= -STRONG_CORRELATION {
        format!("{base}, with an inverse response between selected curves")
    } else {
        base.to_string()
    }
}

fn balance_text(bh: Option<f64>, c1: Option<&str>, c2: Option<&str>) -> String {
    let base = match bh {
        Some(v) if v.is_finite() => {
            if (0.8..=1.25).contains(&v) {
                "balanced response between selected curves"
            } else if v > 1.25 {
                "first selected curve dominates"
            } else {
                "second selected curve dominates"
            }
        }
        _ => return "insufficient curve pair for balance ratio".to_string(),
    };
    match (c1.and_then(curve_family), c2.and_then(curve_family)) {
        (Some(f1), Some(f2)) if f1 != f2 => {
            format!("{base} ({} vs {})", f1.as_str(), f2.as_str())
        }
        _ => base.to_string(),
    }
}

fn character_text(
    ch: Option<f64>,
    first: Option<&CurveSummary>,
    second: Option<&CurveSummary>,
) -> String {
    let base = match ch {
        Some(v) if v.is_finite() => {
            if v >= 1.25 {
                "deeper interval trend strength is relatively higher in curve-2"
            } else if v >= 0.75 {
                "both selected curves show comparable trend strength"
            } else {
                "curve-1 trend dominates"
            }
        }
        _ => return "insufficient data for character ratio".to_string(),
    };
    match (first, second) {
        (Some(a), Some(b)) => {
            let (ta, tb) = (a.trend(), b.trend());
            if ta == Trend::Insufficient || tb == Trend::Insufficient {
                base.to_string()
            } else {
                format!("{base}; {} {ta}, {} {tb}", a.name, b.name)
            }
        }
        _ => base.to_string(),
    }
}

// ============================================================================
// Fluid, risk
// ============================================================================

fn fluid_label(fluid_conf: f64, corr: f64, anomaly: f64) -> FluidLabel {
    if fluid_conf >= 0.72 && corr >= 0.5 {
        FluidLabel::OilProne
    } else if fluid_conf >= 0.58 {
        FluidLabel::MixedSignal
    } else if anomaly >= 0.22 {
        FluidLabel::GasShowPossible
    } else {
        FluidLabel::Weak
    }
}

fn seal_risk(anomaly: f64) -> RiskLevel {
    if anomaly < 0.25 {
        RiskLevel::Low
    } else if anomaly < 0.5 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

fn saturation_risk(severity_conf: f64) -> RiskLevel {
    if severity_conf < 0.45 {
        RiskLevel::Low
    } else if severity_conf < 0.75 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

fn shows(findings: &[IntervalFinding]) -> Vec<Show> {
    findings
        .iter()
        .take(MAX_SHOWS)
        .map(|f| Show {
            from_depth: f.from_depth,
            to_depth: f.to_depth,
            probability: f.probability,
            reason: format!(
                "{} | score={} | priority={}",
                f.reason,
                float_repr(f.score),
                f.priority
            ),
            stability: f.stability.as_str().to_string(),
        })
        .collect()
}

// ============================================================================
// Zones
// ============================================================================

fn zones(
    window: (f64, f64),
    prepared: &PreparedCurves,
    pair: &[&CurveSummary],
    findings: &[IntervalFinding],
) -> Vec<InsightZone> {
    let (from, to) = window;
    let step = (to - from) / ZONE_COUNT as f64;
    let edge = |i: usize| if i == ZONE_COUNT { to } else { from + i as f64 * step };

    (0..ZONE_COUNT)
        .map(|i| {
            let (z0, z1) = (edge(i), edge(i + 1));
            let in_zone: Vec<usize> = prepared
                .depths
                .iter()
                .enumerate()
                .filter(|(_, d)| **d >= z0 && **d <= z1)
                .map(|(k, _)| k)
                .collect();

            let local_anom = if in_zone.is_empty() {
                0.0
            } else {
                let overlaps = findings
                    .iter()
                    .filter(|f| !(f.to_depth < z0 || f.from_depth > z1))
                    .count();
                overlaps as f64 / findings.len().max(1) as f64
            };

            let notes: Vec<String> = pair
                .iter()
                .filter(|c| c.values.len() == prepared.len())
                .filter_map(|c| {
                    let local: Vec<f64> = in_zone.iter().map(|&k| c.values[k]).collect();
                    let m = nanmean(&local);
                    m.is_finite().then(|| format!("{} avg={m:.3}", c.name))
                })
                .collect();

            InsightZone {
                name: format!("Zone {}", i + 1),
                from_depth: round_to(z0, 3),
                to_depth: round_to(z1, 3),
                label: ZoneLabel::from_overlap(local_anom),
                notes: if notes.is_empty() {
                    "insufficient local signal".to_string()
                } else {
                    notes.join(", ")
                },
            }
        })
        .collect()
}

// ============================================================================
// Builder
// ============================================================================

/// Insight synthesis
pub struct InsightBuilder;

impl InsightBuilder {
    /// Build the insight bundle for one analysis.
    ///
    /// `window` is the normalized (shallow, deep) request window and
    /// `curves` the requested curves in caller order.
    pub fn build(
        well_id: &str,
        window: (f64, f64),
        curves: &[String],
        prepared: &PreparedCurves,
        findings: &[IntervalFinding],
        scores: &GlobalScores,
    ) -> Insight {
        let depths = &prepared.depths;
        let first = curves
            .first()
            .map(|c| CurveSummary::new(c, prepared.curve(c).unwrap_or(&[]), depths));
        let second = curves
            .get(1)
            .map(|c| CurveSummary::new(c, prepared.curve(c).unwrap_or(&[]), depths));

        let values1 = first.as_ref().map_or(&[][..], |c| c.values);
        let values2 = second.as_ref().map_or(&[][..], |c| c.values);
        let both = !values1.is_empty() && !values2.is_empty();

        let mean1 = first.as_ref().map_or(f64::NAN, |c| c.mean);
        let mean2 = second.as_ref().map_or(f64::NAN, |c| c.mean);
        let slope1 = first.as_ref().map_or(0.0, |c| c.slope);
        let slope2 = second.as_ref().map_or(0.0, |c| c.slope);
        let corr = if both { safe_corr(values1, values2) } else { 0.0 };

        let anomaly = scores.anomaly_score;
        let severity = scores.severity_confidence;

        let wh = clip(0.45 * anomaly + 0.35 * corr.max(0.0) + 0.20 * severity, 0.0, 1.0);
        let bh = (mean1.is_finite() && mean2.is_finite()).then(|| (mean1 + EPS) / (mean2 + EPS));
        let ch = both.then(|| clip(slope2.abs() / (slope1.abs() + EPS), 0.0, 5.0));

        let fluid_conf = clip(
            0.45 * severity + 0.30 * corr.max(0.0) + 0.25 * anomaly,
            0.0,
            1.0,
        );
        let fluid = fluid_label(fluid_conf, corr, anomaly);

        let mut evidence = Vec::new();
        if let Some(c) = &first {
            evidence.push(mean_evidence(c));
        }
        if let Some(c) = &second {
            evidence.push(mean_evidence(c));
            let c1 = first.as_ref().map_or("", |f| f.name);
            evidence.push(format!("{c1}-{} correlation r={corr:.3}", c.name));
        }
        evidence.push(format!(
            "Anomaly score={anomaly:.3}, severity confidence={severity:.3}"
        ));
        evidence.truncate(MAX_EVIDENCE);

        let seal = seal_risk(anomaly);
        let saturation = saturation_risk(severity);
        let risk_summary = format!(
            "Global risk is {}. Seal risk {}, saturation risk {} for selected interval.",
            scores.severity_band,
            seal.as_str().to_lowercase(),
            saturation.as_str().to_lowercase(),
        );

        let pair: Vec<&CurveSummary> = first.iter().chain(second.iter()).collect();
        let zones = zones(window, prepared, &pair, findings);

        let summary_paragraph = format!(
            "For well {well_id}, interval {:.3}-{:.3} was analyzed across {} selected curve(s). \
             Global risk is {}, with {} key event(s) and detection confidence {:.3}. \
             Signals suggest {}.",
            window.0,
            window.1,
            curves.len(),
            scores.severity_band,
            findings.len(),
            scores.detection_confidence,
            fluid.as_str().to_lowercase(),
        );

        debug!(
            well = well_id,
            wetness = wh,
            fluid = fluid.as_str(),
            "Insight synthesized"
        );

        Insight {
            well: well_id.to_string(),
            from_depth: round_to(window.0, 3),
            to_depth: round_to(window.1, 3),
            analyzed_curves: curves.to_vec(),
            indices: InsightIndices {
                wetness_index: round_to(wh, 3),
                balance_ratio: bh.filter(|v| v.is_finite()).map(|v| round_to(v, 3)),
                character_ratio: ch.filter(|v| v.is_finite()).map(|v| round_to(v, 3)),
                wetness_text: wetness_text(wh, corr),
                balance_text: balance_text(
                    bh,
                    first.as_ref().map(|c| c.name),
                    second.as_ref().map(|c| c.name),
                ),
                character_text: character_text(ch, first.as_ref(), second.as_ref()),
            },
            primary_fluid: PrimaryFluid {
                label: fluid,
                confidence: round_to(fluid_conf, 3),
                evidence,
            },
            shows: shows(findings),
            risk_profile: RiskProfile {
                seal_integrity: seal,
                saturation_risk: saturation,
                summary: risk_summary,
            },
            zones,
            summary_paragraph,
        }
    }
}

fn mean_evidence(c: &CurveSummary) -> String {
    if c.mean.is_finite() {
        format!("{} mean={:.3}", c.name, c.mean)
    } else {
        format!("{} has sparse values", c.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preparation::CurveSeries;
    use crate::types::{IntervalShape, Priority, Probability, SeverityBand, Stability};

    fn prepared(depths: Vec<f64>, curves: Vec<(&str, Vec<f64>)>) -> PreparedCurves {
        PreparedCurves {
            depths,
            curves: curves
                .into_iter()
                .map(|(name, values)| CurveSeries {
                    name: name.into(),
                    values,
                })
                .collect(),
        }
    }

    fn scores(anomaly: f64, severity: f64, events: usize) -> GlobalScores {
        GlobalScores {
            anomaly_score: anomaly,
            detection_confidence: 0.6,
            severity_confidence: severity,
            severity_band: SeverityBand::from_score(anomaly),
            event_count: events,
            event_density: 0.0,
        }
    }

    fn finding(from: f64, to: f64, score: f64) -> IntervalFinding {
        IntervalFinding {
            curve: "GR".into(),
            from_depth: from,
            to_depth: to,
            confidence: 0.7,
            score,
            reason: IntervalShape::Drift,
            curves_supporting: 1,
            width: to - from,
            agreement: 0.0,
            stability: Stability::Stable,
            stability_score: 0.8,
            priority: Priority::from_score(score),
            probability: Probability::bucket(score, 0.7),
        }
    }

    #[test]
    fn correlated_pair_produces_full_indices() {
        let depths: Vec<f64> = (0..100).map(|i| 1000.0 + f64::from(i)).collect();
        let a: Vec<f64> = (0..100).map(|i| 10.0 + f64::from(i)).collect();
        let b: Vec<f64> = (0..100).map(|i| 5.0 + 0.5 * f64::from(i)).collect();
        let p = prepared(depths, vec![("GR", a), ("RHOB", b)]);
        let curves = p.names();
        let s = scores(0.6, 0.7, 0);
        let insight = InsightBuilder::build("W-1", (1000.0, 1099.0), &curves, &p, &[], &s);

        // 0.45 * 0.6 + 0.35 * 1.0 + 0.20 * 0.7 = 0.76
        assert!((insight.indices.wetness_index - 0.76).abs() < 1e-9);
        assert!(insight.indices.wetness_text.starts_with("high likelihood"));
        assert!(insight.indices.wetness_text.contains("strong positive curve correlation"));
        // (59.5 + eps) / (29.75 + eps)
        assert_eq!(insight.indices.balance_ratio, Some(2.0));
        assert_eq!(
            insight.indices.balance_text,
            "first selected curve dominates (gamma-ray vs density)"
        );
        assert_eq!(insight.indices.character_ratio, Some(0.5));
        assert!(insight.indices.character_text.starts_with("curve-1 trend dominates"));
        assert_eq!(insight.primary_fluid.label, FluidLabel::OilProne);
        assert_eq!(insight.primary_fluid.evidence.len(), 4);
        assert_eq!(insight.primary_fluid.evidence[2], "GR-RHOB correlation r=1.000");
        assert_eq!(insight.risk_profile.seal_integrity, RiskLevel::High);
        assert_eq!(insight.risk_profile.saturation_risk, RiskLevel::Medium);
    }

    #[test]
    fn single_curve_has_undefined_pair_indices() {
        let depths: Vec<f64> = (0..30).map(f64::from).collect();
        let p = prepared(depths, vec![("GR", vec![50.0; 30])]);
        let curves = p.names();
        let s = scores(0.1, 0.3, 0);
        let insight = InsightBuilder::build("W-2", (0.0, 29.0), &curves, &p, &[], &s);
        assert_eq!(insight.indices.balance_ratio, None);
        assert_eq!(insight.indices.character_ratio, None);
        assert_eq!(
            insight.indices.balance_text,
            "insufficient curve pair for balance ratio"
        );
        assert_eq!(
            insight.indices.character_text,
            "insufficient data for character ratio"
        );
        assert_eq!(insight.primary_fluid.label, FluidLabel::Weak);
        assert_eq!(insight.risk_profile.seal_integrity, RiskLevel::Low);
        assert_eq!(insight.zones[0].notes, "GR avg=50.000");
    }

    #[test]
    fn four_zones_cover_window_and_follow_findings() {
        let depths: Vec<f64> = (0..=100).map(f64::from).collect();
        let p = prepared(depths, vec![("GR", vec![1.0; 101])]);
        let curves = p.names();
        let findings = vec![finding(5.0, 10.0, 7.0), finding(12.0, 20.0, 4.0)];
        let s = scores(0.5, 0.5, 2);
        let insight = InsightBuilder::build("W-3", (0.0, 100.0), &curves, &p, &findings, &s);

        assert_eq!(insight.zones.len(), 4);
        assert_eq!(insight.zones[0].from_depth, 0.0);
        assert_eq!(insight.zones[3].to_depth, 100.0);
        assert_eq!(insight.zones[0].label, ZoneLabel::HighActivity);
        assert_eq!(insight.zones[1].label, ZoneLabel::RelativelyStable);
        assert_eq!(insight.zones[1].name, "Zone 2");

        assert_eq!(insight.shows.len(), 2);
        assert_eq!(insight.shows[0].reason, "drift | score=7.0 | priority=strong");
        assert_eq!(insight.shows[0].stability, "stable");
        assert!(insight
            .summary_paragraph
            .starts_with("For well W-3, interval 0.000-100.000 was analyzed"));
    }

    #[test]
    fn no_curves_still_builds() {
        let p = PreparedCurves::default();
        let s = scores(0.0, 0.2, 0);
        let insight = InsightBuilder::build("W-4", (0.0, 10.0), &[], &p, &[], &s);
        assert_eq!(insight.primary_fluid.evidence.len(), 1);
        assert!(insight.zones.iter().all(|z| z.notes == "insufficient local signal"));
    }
}
