//! Model output parsing
//!
//! Models wrap JSON in code fences, prefix it with prose, or emit numbers
//! where the schema asks for text. Extraction strips fences, then falls back
//! to decoding the first complete JSON object found at any `{`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::LlmError;

// ============================================================================
// Schema
// ============================================================================

/// Structured interpretation returned by the LLM or the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub summary: String,
    #[serde(default)]
    pub geochemical_metrics: GeochemicalMetrics,
    #[serde(default)]
    pub gas_shows: Vec<GasShow>,
    pub fluid_type: String,
    #[serde(default)]
    pub fluid_evidence: String,
    #[serde(default)]
    pub risk_profile: RiskProfile,
    #[serde(default)]
    pub zones: Vec<InterpretedZone>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeochemicalMetrics {
    #[serde(default, deserialize_with = "lenient_string")]
    pub wetness_index: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub balance_ratio: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub character_ratio: String,
}

/// A depth band with concentrated hydrocarbon response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasShow {
    #[serde(deserialize_with = "lenient_f64")]
    pub depth_top: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub depth_bottom: f64,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub fluid_probability: String,
    #[serde(default)]
    pub geological_context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    #[serde(default)]
    pub seal_risk: String,
    #[serde(default)]
    pub saturation_risk: String,
    #[serde(default)]
    pub technical_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretedZone {
    #[serde(deserialize_with = "lenient_f64")]
    pub depth_top: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub depth_bottom: f64,
    #[serde(default)]
    pub characterization: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key_markers: String,
}

/// Accept text, numbers or null where the schema asks for text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Accept numbers or numeric strings where the schema asks for a float.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("depth is not representable as f64")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("depth '{s}' is not numeric"))),
        other => Err(serde::de::Error::custom(format!(
            "expected a depth, found {other}"
        ))),
    }
}

// ============================================================================
// Extraction
// ============================================================================

fn strip_fences(text: &str) -> &str {
    let mut candidate = text.trim();
    if candidate.starts_with("```") {
        candidate = match candidate.split_once('\n') {
            Some((_, rest)) => rest,
            None => &candidate[3..],
        };
    }
    if let Some(stripped) = candidate.strip_suffix("```") {
        candidate = stripped;
    }
    candidate = candidate.trim();
    if let Some(stripped) = candidate.strip_prefix("json") {
        candidate = stripped.trim();
    }
    candidate
}

/// First JSON object in model output, or `None`.
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let candidate = strip_fences(text);
    if candidate.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
        return Some(map);
    }

    candidate
        .char_indices()
        .filter(|(_, c)| *c == '{')
        .find_map(|(start, _)| {
            let mut stream =
                serde_json::Deserializer::from_str(&candidate[start..]).into_iter::<Value>();
            match stream.next() {
                Some(Ok(Value::Object(map))) => Some(map),
                _ => None,
            }
        })
}

/// Extract and validate an interpretation from raw model output.
pub fn parse_interpretation(text: &str) -> Result<Interpretation, LlmError> {
    let object = extract_json_object(text).ok_or(LlmError::MalformedJson)?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{"summary": "s", "fluid_type": "dry gas system"}"#;

    #[test]
    fn parses_plain_object() {
        let parsed = parse_interpretation(MINIMAL).unwrap();
        assert_eq!(parsed.summary, "s");
        assert!(parsed.gas_shows.is_empty());
        assert!(parsed.recommendations.is_empty());
    }

    #[test]
    fn strips_code_fences_and_json_tag() {
        let fenced = format!("```json\n{MINIMAL}\n```");
        assert!(extract_json_object(&fenced).is_some());
        let tagged = format!("json {MINIMAL}");
        assert!(extract_json_object(&tagged).is_some());
    }

    #[test]
    fn finds_object_after_prose() {
        let text = format!("Here is the analysis: {MINIMAL} Let me know if you need more.");
        let obj = extract_json_object(&text).unwrap();
        assert_eq!(obj["fluid_type"], "dry gas system");
    }

    #[test]
    fn skips_unbalanced_brace_before_object() {
        let text = format!("{{ not json {MINIMAL}");
        let obj = extract_json_object(&text).unwrap();
        assert_eq!(obj["summary"], "s");
    }

    #[test]
    fn rejects_non_object_output() {
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("").is_none());
        assert!(matches!(
            parse_interpretation("no json here"),
            Err(LlmError::MalformedJson)
        ));
    }

    #[test]
    fn lenient_fields() {
        let text = r#"{
            "summary": "s",
            "fluid_type": "f",
            "geochemical_metrics": {"wetness_index": 0.31, "balance_ratio": null},
            "gas_shows": [{"depth_top": "1200.5", "depth_bottom": 1210,
                           "analysis": "a", "fluid_probability": "High",
                           "geological_context": "c"}]
        }"#;
        let parsed = parse_interpretation(text).unwrap();
        assert_eq!(parsed.geochemical_metrics.wetness_index, "0.31");
        assert_eq!(parsed.geochemical_metrics.balance_ratio, "");
        assert_eq!(parsed.gas_shows[0].depth_top, 1200.5);
        assert_eq!(parsed.gas_shows[0].depth_bottom, 1210.0);
    }

    #[test]
    fn missing_required_field_is_schema_error() {
        let result = parse_interpretation(r#"{"summary": "only"}"#);
        assert!(matches!(result, Err(LlmError::Schema(_))));
    }
}
