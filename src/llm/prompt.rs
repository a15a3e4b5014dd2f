//! Interpretation prompt building
//!
//! The model sees three evidence blocks: per-curve summary statistics, up to
//! 30 stride-sampled rows, and derived diagnostics (dominant-variance curves,
//! per-curve trend/max/high zone, pairwise correlations). The same context
//! drives the deterministic fallback, so both paths reason over identical
//! numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatRequest};
use crate::narrative::float_repr;
use crate::stats::{correlation_p_value, diagnostic_trend, pearson, percentile_sorted, round_to};
use crate::types::{AnalysisRequest, LogRow};

/// Rows shown in the sampled-data block.
pub const MAX_SAMPLE_ROWS: usize = 30;

/// Row budget for diagnostic curve pairs; longer inputs are strided.
pub const MAX_PAIR_ROWS: usize = 4000;

/// Curves examined in depth by the diagnostics block.
const MAX_DOMINANT_CURVES: usize = 4;

/// Curves entering the pairwise correlation lines.
const MAX_CORRELATED_CURVES: usize = 3;

const INTERPRETATION_TEMPERATURE: f64 = 0.45;
const INTERPRETATION_MAX_TOKENS: u32 = 3000;

pub const INTERPRETATION_SYSTEM: &str = "You are a precise geochemical analyst. \
Always return valid JSON with evidence-driven, non-generic conclusions.";

const INTERPRETATION_PROMPT: &str = r#"You are a senior well-log geochemistry analyst producing high-confidence technical interpretation.

Well: {well}
Depth interval: {depth_min} to {depth_max}

Use the curve statistics, sampled rows, and derived diagnostics below.
Do not produce generic statements; every section must anchor to numbers, curve mnemonics, and depth intervals.

Interpretation requirements:
1. Identify strongest hydrocarbon-response intervals with exact depth ranges.
2. Distinguish primary fluid tendency and explain with evidence from multiple curves.
3. Provide risk profile with explicit technical rationale.
4. Segment 2 to 4 non-overlapping zones with clear characterization.
5. Recommendations must be concrete, not generic.
6. Avoid vague phrasing like "varying strength" without quantified evidence.
7. Ensure output differs when input curves/depth interval differ.

Curve statistics:
{statistics}

Sampled data:
{sample_rows}

Derived diagnostics:
{diagnostics}

Return strict JSON with this schema:
{
  "summary": "strong technical summary with explicit interval and curve evidence",
  "geochemical_metrics": {
    "wetness_index": "value and interpretation",
    "balance_ratio": "value and interpretation",
    "character_ratio": "value and interpretation"
  },
  "gas_shows": [
    {
      "depth_top": float,
      "depth_bottom": float,
      "analysis": "what the data suggests",
      "fluid_probability": "High/Med/Low",
      "geological_context": "brief context"
    }
  ],
  "fluid_type": "primary fluid interpretation",
  "fluid_evidence": "key evidence from curves and ratios",
  "risk_profile": {
    "seal_risk": "Low/Med/High",
    "saturation_risk": "Low/Med/High",
    "technical_summary": "single-sentence risk summary"
  },
  "zones": [
    {
      "depth_top": float,
      "depth_bottom": float,
      "characterization": "zone label",
      "key_markers": "key markers"
    }
  ],
  "recommendations": ["clear recommendation"]
}

Return raw JSON only. Do not include markdown or prose outside JSON.
"#;

// ============================================================================
// Context
// ============================================================================

/// Summary statistics of one curve as handed to the interpreter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveSummaryStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub non_null_count: usize,
}

impl CurveSummaryStats {
    /// Min/max/mean over finite values, rounded to 4 decimals.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            min: Some(round_to(min, 4)),
            max: Some(round_to(max, 4)),
            mean: Some(round_to(sum / count as f64, 4)),
            non_null_count: count,
        }
    }
}

/// Everything the interpreter (LLM or fallback) reasons over.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretationContext {
    pub well_name: String,
    pub curves: Vec<String>,
    pub depth_min: f64,
    pub depth_max: f64,
    pub statistics: BTreeMap<String, CurveSummaryStats>,
    pub rows: Vec<LogRow>,
}

impl InterpretationContext {
    /// Build the context for an analysis request: normalized window,
    /// deduplicated curves and per-curve statistics over every row.
    pub fn from_request(request: &AnalysisRequest) -> Self {
        let (depth_min, depth_max) = request.depth_window();
        let curves = request.unique_curves();
        let statistics = curves
            .iter()
            .map(|c| {
                let stats = CurveSummaryStats::from_values(
                    request.rows.iter().filter_map(|r| r.value(c)),
                );
                (c.clone(), stats)
            })
            .collect();

        Self {
            well_name: request.well_id.clone(),
            curves,
            depth_min,
            depth_max,
            statistics,
            rows: request.rows.clone(),
        }
    }

    /// Statistics for `curve`, if the caller supplied any.
    pub fn stats(&self, curve: &str) -> Option<&CurveSummaryStats> {
        self.statistics.get(curve)
    }

    /// Curves with at least one finite sample, in caller order.
    pub fn valid_curves(&self) -> Vec<&str> {
        self.curves
            .iter()
            .filter(|c| self.stats(c).is_some_and(|s| s.non_null_count > 0))
            .map(String::as_str)
            .collect()
    }
}

// ============================================================================
// Evidence blocks
// ============================================================================

fn opt_repr(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), float_repr)
}

/// One indented line per curve, in caller order.
pub fn format_statistics(ctx: &InterpretationContext) -> String {
    ctx.curves
        .iter()
        .filter_map(|curve| {
            let s = ctx.stats(curve)?;
            Some(if s.non_null_count > 0 {
                format!(
                    "  {curve}: min={}, max={}, mean={}, points={}",
                    opt_repr(s.min),
                    opt_repr(s.max),
                    opt_repr(s.mean),
                    s.non_null_count
                )
            } else {
                format!("  {curve}: no valid data")
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pipe-separated table of at most `max_rows` rows taken at a fixed stride.
pub fn format_sample_rows(rows: &[LogRow], curves: &[String], max_rows: usize) -> String {
    if rows.is_empty() {
        return "No data available.".to_string();
    }
    let step = (rows.len() / max_rows.max(1)).max(1);

    let header = format!("Depth | {}", curves.join(" | "));
    let mut lines = vec![header.clone(), "-".repeat(header.len())];
    for row in rows.iter().step_by(step).take(max_rows) {
        let values: Vec<String> = curves
            .iter()
            .map(|c| opt_repr(row.values.get(c).copied().flatten()))
            .collect();
        lines.push(format!("{} | {}", float_repr(row.depth), values.join(" | ")));
    }
    lines.join("\n")
}

/// (depth, value) pairs for one curve, strided to at most ~4000 rows.
pub fn curve_pairs(rows: &[LogRow], curve: &str) -> Vec<(f64, f64)> {
    let stride = (rows.len() / MAX_PAIR_ROWS).max(1);
    rows.iter()
        .step_by(stride)
        .filter(|r| r.depth.is_finite())
        .filter_map(|r| r.value(curve).map(|v| (r.depth, v)))
        .collect()
}

/// Value at or above the 90th percentile of `values`.
pub fn p90(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(percentile_sorted(&sorted, 90.0))
}

/// Shallowest/deepest depth whose value reaches the 90th percentile.
pub fn high_zone(pairs: &[(f64, f64)]) -> Option<(f64, f64, f64)> {
    let values: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
    let threshold = p90(&values)?;
    let depths: Vec<f64> = pairs
        .iter()
        .filter(|(_, v)| *v >= threshold)
        .map(|(d, _)| *d)
        .collect();
    let top = depths.iter().copied().reduce(f64::min)?;
    let bottom = depths.iter().copied().reduce(f64::max)?;
    Some((top, bottom, threshold))
}

fn dominant_curves(ctx: &InterpretationContext) -> Vec<String> {
    let mut ranges: Vec<(f64, &String)> = ctx
        .curves
        .iter()
        .filter_map(|c| {
            let s = ctx.stats(c).filter(|s| s.non_null_count > 0)?;
            s.mean?;
            Some((s.max? - s.min?, c))
        })
        .collect();
    ranges.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranges
        .into_iter()
        .take(MAX_DOMINANT_CURVES)
        .map(|(_, c)| c.clone())
        .collect()
}

fn curve_line(curve: &str, pairs: &[(f64, f64)]) -> String {
    let values: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    // first occurrence of the maximum
    let (max_depth, max_value) = pairs
        .iter()
        .copied()
        .fold((f64::NAN, f64::NEG_INFINITY), |best, (d, v)| {
            if v > best.1 {
                (d, v)
            } else {
                best
            }
        });
    let zone = high_zone(pairs).map_or_else(
        || "n/a".to_string(),
        |(top, bottom, _)| {
            format!(
                "{}-{}",
                float_repr(round_to(top, 1)),
                float_repr(round_to(bottom, 1))
            )
        },
    );

    format!(
        "{curve}: trend={}, mean={}, max={} at {}, high-zone(p90+)={zone}",
        diagnostic_trend(&values),
        float_repr(round_to(mean, 4)),
        float_repr(round_to(max_value, 4)),
        float_repr(round_to(max_depth, 1)),
    )
}

/// Derived diagnostics block, one `- ` line per finding.
pub fn build_diagnostics(ctx: &InterpretationContext) -> String {
    let mut lines = vec![
        format!(
            "Interval length: {}",
            float_repr(round_to(ctx.depth_max - ctx.depth_min, 2))
        ),
        format!("Curves analyzed: {}", ctx.curves.join(", ")),
    ];

    let dominant = dominant_curves(ctx);
    lines.push(format!(
        "Dominant-variance curves: {}",
        if dominant.is_empty() {
            "none".to_string()
        } else {
            dominant.join(", ")
        }
    ));

    let focus: Vec<String> = if dominant.is_empty() {
        ctx.curves.iter().take(MAX_DOMINANT_CURVES).cloned().collect()
    } else {
        dominant
    };

    let mut curve_values: Vec<(String, Vec<f64>)> = Vec::new();
    for curve in &focus {
        let pairs = curve_pairs(&ctx.rows, curve);
        if pairs.len() < 3 {
            continue;
        }
        lines.push(curve_line(curve, &pairs));
        curve_values.push((curve.clone(), pairs.into_iter().map(|(_, v)| v).collect()));
    }

    let candidates = &curve_values[..curve_values.len().min(MAX_CORRELATED_CURVES)];
    for (i, (a, va)) in candidates.iter().enumerate() {
        for (b, vb) in &candidates[i + 1..] {
            let Some(r) = pearson(va, vb) else {
                continue;
            };
            let n = va.len().min(vb.len());
            lines.push(format!(
                "Correlation {a} vs {b}: r={}, p={}",
                float_repr(round_to(r, 4)),
                float_repr(round_to(correlation_p_value(r, n), 4))
            ));
        }
    }

    lines
        .iter()
        .map(|l| format!("- {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill the interpretation template for `ctx`.
pub fn interpretation_prompt(ctx: &InterpretationContext) -> String {
    INTERPRETATION_PROMPT
        .replace("{well}", &ctx.well_name)
        .replace("{depth_min}", &float_repr(ctx.depth_min))
        .replace("{depth_max}", &float_repr(ctx.depth_max))
        .replace("{statistics}", &format_statistics(ctx))
        .replace(
            "{sample_rows}",
            &format_sample_rows(&ctx.rows, &ctx.curves, MAX_SAMPLE_ROWS),
        )
        .replace("{diagnostics}", &build_diagnostics(ctx))
}

/// Chat request for one interpretation call.
pub fn interpretation_request(ctx: &InterpretationContext) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(INTERPRETATION_SYSTEM),
            ChatMessage::user(interpretation_prompt(ctx)),
        ],
        temperature: INTERPRETATION_TEMPERATURE,
        max_tokens: INTERPRETATION_MAX_TOKENS,
    }
}
