//! Deterministic fallback interpreter
//!
//! Produces an `Interpretation` from the same context the LLM would see,
//! using mean-based hydrocarbon ranking and fixed thresholds.
//!
//! ## Derived indices
//!
//! - **Wetness**: heavy / (light + heavy), light = HC1..HC3 means, heavy =
//!   HC4..HC7 means; drives the fluid label
//! - **Balance**: TOTAL_GAS mean over the primary curve mean when TOTAL_GAS
//!   is present, else the primary mean
//! - **Character**: heavy / light
//!
//! Gas shows come from each leading curve's p90+ band, zones from three
//! equal-width slices compared against their average intensity.

use tracing::debug;

use super::parsing::{GasShow, GeochemicalMetrics, Interpretation, InterpretedZone, RiskProfile};
use super::prompt::{curve_pairs, high_zone, InterpretationContext};
use crate::narrative::float_repr;
use crate::stats::{round_to, EPS};

/// Pairs required before a p90 gas show is reported.
const MIN_SHOW_PAIRS: usize = 8;

const LIGHT_TAGS: [&str; 3] = ["HC1", "HC2", "HC3"];
const HEAVY_TAGS: [&str; 4] = ["HC4", "HC5", "HC6", "HC7"];
const TOTAL_GAS: &str = "TOTAL_GAS";

const INSUFFICIENT_METRIC: &str = "n/a, insufficient data";

fn repr(value: f64, digits: i32) -> String {
    float_repr(round_to(value, digits))
}

/// Fluid label from the wetness index.
pub fn fluid_type_for_wetness(wetness: f64) -> &'static str {
    if wetness <= 0.17 {
        "dry gas system"
    } else if wetness <= 0.40 {
        "gas-prone hydrocarbon system"
    } else if wetness <= 0.65 {
        "mixed gas and oil system"
    } else {
        "oil-prone or condensate-rich system"
    }
}

fn zone_label(relative: f64) -> &'static str {
    if relative >= 1.2 {
        "gas-enriched zone"
    } else if relative >= 0.85 {
        "mixed fluid zone"
    } else {
        "lower-intensity hydrocarbon zone"
    }
}

fn seal_risk(variability: f64) -> &'static str {
    if variability > 2.2 {
        "High"
    } else if variability > 1.2 {
        "Med"
    } else {
        "Low"
    }
}

fn saturation_risk(deep: f64, shallow: f64) -> &'static str {
    let reference = shallow.max(EPS);
    if deep < 0.55 * reference {
        "High"
    } else if deep < 0.8 * reference {
        "Med"
    } else {
        "Low"
    }
}

fn is_hydrocarbon_curve(name: &str) -> bool {
    let upper = name.to_uppercase();
    upper.contains("HC") || upper.contains("GAS") || upper.starts_with('C')
}

fn insufficient(ctx: &InterpretationContext) -> Interpretation {
    Interpretation {
        summary: format!(
            "No valid numeric samples were found in {}-{} for well '{}'.",
            float_repr(ctx.depth_min),
            float_repr(ctx.depth_max),
            ctx.well_name
        ),
        geochemical_metrics: GeochemicalMetrics {
            wetness_index: INSUFFICIENT_METRIC.to_string(),
            balance_ratio: INSUFFICIENT_METRIC.to_string(),
            character_ratio: INSUFFICIENT_METRIC.to_string(),
        },
        gas_shows: Vec::new(),
        fluid_type: "insufficient data".to_string(),
        fluid_evidence: "No curves with valid points were available in the selected interval."
            .to_string(),
        risk_profile: RiskProfile {
            seal_risk: "High".to_string(),
            saturation_risk: "High".to_string(),
            technical_summary: "Interpretation confidence is low due to missing valid curve values."
                .to_string(),
        },
        zones: Vec::new(),
        recommendations: vec![
            "Verify data quality and null-value handling for the selected interval.".to_string(),
            "Expand depth interval or include additional valid curves before interpretation."
                .to_string(),
        ],
    }
}

/// Mean hydrocarbon intensity of `curves` over rows within [start, end].
///
/// Each row contributes the mean of its finite values; rows with none are
/// skipped. 0.0 when no row qualifies.
fn zone_intensity(ctx: &InterpretationContext, curves: &[&str], start: f64, end: f64) -> f64 {
    let per_row: Vec<f64> = ctx
        .rows
        .iter()
        .filter(|r| r.depth.is_finite() && r.depth >= start && r.depth <= end)
        .filter_map(|r| {
            let vals: Vec<f64> = curves.iter().filter_map(|c| r.value(c)).collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        })
        .collect();
    if per_row.is_empty() {
        0.0
    } else {
        per_row.iter().sum::<f64>() / per_row.len() as f64
    }
}

fn gas_show(ctx: &InterpretationContext, curve: &str, probability: &str) -> Option<GasShow> {
    let pairs = curve_pairs(&ctx.rows, curve);
    if pairs.len() < MIN_SHOW_PAIRS {
        return None;
    }
    let (top, bottom, threshold) = high_zone(&pairs)?;
    Some(GasShow {
        depth_top: round_to(top, 1),
        depth_bottom: round_to(bottom, 1),
        analysis: format!(
            "{curve} exceeds its high-response threshold ({}) indicating concentrated hydrocarbon response.",
            repr(threshold, 3)
        ),
        fluid_probability: probability.to_string(),
        geological_context: format!("High-response band driven by {curve} in this interval."),
    })
}

/// Deterministic interpretation for `ctx`. Never fails.
pub fn fallback_interpretation(ctx: &InterpretationContext) -> Interpretation {
    let valid = ctx.valid_curves();
    if valid.is_empty() {
        return insufficient(ctx);
    }

    let mean_of = |curve: &str| -> f64 {
        ctx.stats(curve)
            .and_then(|s| s.mean)
            .filter(|m| m.is_finite())
            .unwrap_or(0.0)
    };
    let by_mean_desc = |curves: &mut Vec<&str>| {
        curves.sort_by(|a, b| mean_of(b).total_cmp(&mean_of(a)));
    };

    let mut ranked: Vec<&str> = valid
        .iter()
        .copied()
        .filter(|c| is_hydrocarbon_curve(c))
        .collect();
    if ranked.is_empty() {
        ranked = valid.clone();
        by_mean_desc(&mut ranked);
        ranked.truncate(4);
    }
    by_mean_desc(&mut ranked);

    let primary = ranked[0];
    let secondary = ranked.get(1).copied().unwrap_or(primary);

    let tagged_sum = |tags: &[&str]| -> f64 {
        ranked
            .iter()
            .filter(|c| {
                let upper = c.to_uppercase();
                tags.iter().any(|t| upper.contains(t))
            })
            .map(|c| mean_of(c))
            .sum()
    };
    let light = tagged_sum(&LIGHT_TAGS);
    let heavy = tagged_sum(&HEAVY_TAGS);

    let wetness = if light + heavy > 0.0 {
        heavy / (light + heavy)
    } else {
        0.0
    };
    let balance = if ctx.statistics.contains_key(TOTAL_GAS) {
        mean_of(TOTAL_GAS) / mean_of(primary).max(EPS)
    } else {
        mean_of(primary)
    };
    let character = if light > 0.0 {
        heavy / light.max(EPS)
    } else {
        heavy
    };
    let fluid_type = fluid_type_for_wetness(wetness);

    let gas_shows: Vec<GasShow> = [(primary, "High"), (secondary, "Med")]
        .into_iter()
        .filter_map(|(curve, probability)| gas_show(ctx, curve, probability))
        .collect();

    // Three equal-width zones
    let span = ctx.depth_max - ctx.depth_min;
    let bounds = [
        (ctx.depth_min, ctx.depth_min + span / 3.0),
        (ctx.depth_min + span / 3.0, ctx.depth_min + 2.0 * span / 3.0),
        (ctx.depth_min + 2.0 * span / 3.0, ctx.depth_max),
    ];
    let leaders = &ranked[..ranked.len().min(3)];
    let intensities: Vec<f64> = bounds
        .iter()
        .map(|(a, b)| zone_intensity(ctx, leaders, *a, *b))
        .collect();
    let overall = intensities.iter().sum::<f64>() / intensities.len() as f64;

    let zones: Vec<InterpretedZone> = bounds
        .iter()
        .zip(&intensities)
        .map(|((start, end), intensity)| {
            let relative = if overall > 0.0 {
                intensity / overall.max(EPS)
            } else {
                0.0
            };
            InterpretedZone {
                depth_top: round_to(*start, 1),
                depth_bottom: round_to(*end, 1),
                characterization: zone_label(relative).to_string(),
                key_markers: format!(
                    "Relative hydrocarbon intensity={} using {}",
                    repr(relative, 2),
                    leaders.join(", ")
                ),
            }
        })
        .collect();

    let (p_min, p_max, p_mean) = ctx.stats(primary).map_or((0.0, 0.0, 0.0), |s| {
        (
            s.min.unwrap_or(0.0),
            s.max.unwrap_or(0.0),
            s.mean.unwrap_or(0.0),
        )
    });
    let variability = (p_max - p_min) / p_mean.max(EPS);
    let seal = seal_risk(variability);
    let saturation = saturation_risk(intensities[2], intensities[0]);

    debug!(
        well = %ctx.well_name,
        primary = primary,
        wetness = wetness,
        shows = gas_shows.len(),
        "Fallback interpretation built"
    );

    Interpretation {
        summary: format!(
            "In {}-{}, strongest responses are driven by {primary} (mean {}) and {secondary} (mean {}), with inferred {fluid_type}.",
            repr(ctx.depth_min, 1),
            repr(ctx.depth_max, 1),
            repr(mean_of(primary), 3),
            repr(mean_of(secondary), 3),
        ),
        geochemical_metrics: GeochemicalMetrics {
            wetness_index: format!("{} (derived)", repr(wetness, 4)),
            balance_ratio: format!("{} (derived)", repr(balance, 4)),
            character_ratio: format!("{} (derived)", repr(character, 4)),
        },
        gas_shows,
        fluid_type: fluid_type.to_string(),
        fluid_evidence: format!(
            "Primary evidence: {primary} and {secondary} high-response intervals, wetness index {}, and variability ratio {}.",
            repr(wetness, 3),
            repr(variability, 3),
        ),
        risk_profile: RiskProfile {
            seal_risk: seal.to_string(),
            saturation_risk: saturation.to_string(),
            technical_summary: format!(
                "Seal risk {seal} and saturation risk {saturation} derived from {primary} variability and deep-to-shallow intensity contrast."
            ),
        },
        zones,
        recommendations: vec![
            format!("Validate {primary} and {secondary} with complementary petrophysical logs."),
            "Run focused sampling/coring across highest-response intervals to confirm fluid typing."
                .to_string(),
            "Cross-check drilling parameters versus hydrocarbon intensity transitions between zones."
                .to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisRequest, LogRow};

    fn context(
        curves: &[&str],
        n: usize,
        value: impl Fn(&str, usize) -> Option<f64>,
    ) -> InterpretationContext {
        let rows = (0..n)
            .map(|i| {
                curves
                    .iter()
                    .fold(LogRow::new(1000.0 + i as f64), |row, c| row.with(c, value(c, i)))
            })
            .collect();
        InterpretationContext::from_request(&AnalysisRequest {
            well_id: "W-9".into(),
            from_depth: 1000.0,
            to_depth: 1000.0 + (n.max(1) - 1) as f64,
            curves: curves.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    #[test]
    fn no_valid_curves_gives_insufficient_interpretation() {
        let ctx = context(&["HC1"], 10, |_, _| None);
        let out = fallback_interpretation(&ctx);
        assert_eq!(out.fluid_type, "insufficient data");
        assert_eq!(out.summary, "No valid numeric samples were found in 1000.0-1009.0 for well 'W-9'.");
        assert_eq!(out.risk_profile.seal_risk, "High");
        assert_eq!(out.recommendations.len(), 2);
        assert!(out.zones.is_empty());
    }

    #[test]
    fn wetness_bands() {
        assert_eq!(fluid_type_for_wetness(0.0), "dry gas system");
        assert_eq!(fluid_type_for_wetness(0.17), "dry gas system");
        assert_eq!(fluid_type_for_wetness(0.3), "gas-prone hydrocarbon system");
        assert_eq!(fluid_type_for_wetness(0.5), "mixed gas and oil system");
        assert_eq!(fluid_type_for_wetness(0.9), "oil-prone or condensate-rich system");
    }

    #[test]
    fn ranks_hydrocarbon_curves_by_mean() {
        let ctx = context(&["GR", "HC1", "HC4"], 30, |c, _| match c {
            "GR" => Some(100.0),
            "HC1" => Some(30.0),
            _ => Some(10.0),
        });
        let out = fallback_interpretation(&ctx);
        // GR is not a hydrocarbon curve, so HC1 leads
        assert!(out.summary.contains("driven by HC1 (mean 30.0) and HC4 (mean 10.0)"));
        // wetness = 10 / 40
        assert_eq!(out.geochemical_metrics.wetness_index, "0.25 (derived)");
        assert_eq!(out.geochemical_metrics.character_ratio, "0.3333 (derived)");
        assert_eq!(out.geochemical_metrics.balance_ratio, "30.0 (derived)");
        assert_eq!(out.fluid_type, "gas-prone hydrocarbon system");
        assert_eq!(out.recommendations[0], "Validate HC1 and HC4 with complementary petrophysical logs.");
    }

    #[test]
    fn flat_curves_give_uniform_zones_and_low_risk() {
        let ctx = context(&["HC1", "HC2"], 30, |_, _| Some(5.0));
        let out = fallback_interpretation(&ctx);
        assert_eq!(out.zones.len(), 3);
        for zone in &out.zones {
            assert_eq!(zone.characterization, "mixed fluid zone");
            assert_eq!(zone.key_markers, "Relative hydrocarbon intensity=1.0 using HC1, HC2");
        }
        assert_eq!(out.zones[0].depth_top, 1000.0);
        assert_eq!(out.zones[2].depth_bottom, 1029.0);
        assert_eq!(out.risk_profile.seal_risk, "Low");
        assert_eq!(out.risk_profile.saturation_risk, "Low");
        // constant curve: every sample reaches p90
        assert_eq!(out.gas_shows.len(), 2);
        assert_eq!(out.gas_shows[0].fluid_probability, "High");
        assert_eq!(out.gas_shows[0].depth_top, 1000.0);
        assert_eq!(out.gas_shows[0].depth_bottom, 1029.0);
    }

    #[test]
    fn fading_deep_response_raises_saturation_risk() {
        let ctx = context(&["C1"], 30, |_, i| Some(if i < 10 { 100.0 } else { 10.0 }));
        let out = fallback_interpretation(&ctx);
        assert_eq!(out.risk_profile.saturation_risk, "High");
        assert_eq!(out.zones[0].characterization, "gas-enriched zone");
        assert_eq!(out.zones[2].characterization, "lower-intensity hydrocarbon zone");
        // single curve is both primary and secondary
        assert!(out.summary.contains("driven by C1 (mean 40.0) and C1 (mean 40.0)"));
    }

    #[test]
    fn non_hydrocarbon_curves_fall_back_to_top_means() {
        let ctx = context(&["GR", "RHOB"], 10, |c, _| Some(if c == "GR" { 80.0 } else { 2.4 }));
        let out = fallback_interpretation(&ctx);
        assert!(out.summary.contains("driven by GR (mean 80.0) and RHOB (mean 2.4)"));
        assert_eq!(out.gas_shows.len(), 2);
    }

    #[test]
    fn short_curves_produce_no_gas_shows() {
        let ctx = context(&["HC1"], 7, |_, i| Some(i as f64));
        let out = fallback_interpretation(&ctx);
        assert!(out.gas_shows.is_empty());
        assert_eq!(out.zones.len(), 3);
    }

    #[test]
    fn total_gas_normalizes_balance() {
        let ctx = context(&["HC1", "TOTAL_GAS"], 12, |c, _| {
            Some(if c == "HC1" { 20.0 } else { 50.0 })
        });
        let out = fallback_interpretation(&ctx);
        // TOTAL_GAS ranks first by mean, so balance is 50 / 50
        assert_eq!(out.geochemical_metrics.balance_ratio, "1.0 (derived)");
    }
}
