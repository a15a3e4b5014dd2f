//! Checks applied to `wellscan.toml` before and after deserialization
//!
//! - **Unknown keys**: the raw document is walked as a `toml::Value` and
//!   every dotted path missing from [`known_config_keys`] becomes a warning,
//!   with the nearest known key (edit distance <= 3) offered as a fix.
//!   Serde's `#[serde(default)]` would otherwise silently ignore a typo.
//! - **Ranges**: weights, percentiles and counts on the typed config, all
//!   violations collected into one list.

use std::collections::HashSet;

use super::WellscanConfig;

/// Unknown-key finding. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Dotted key path as written in the file
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.suggestion {
            Some(key) => write!(f, "{}; closest known key is '{key}'", self.message),
            None => f.write_str(&self.message),
        }
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `WellscanConfig`.
///
/// Any new field added to the config structs must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [detection]
        "detection",
        "detection.min_rows",
        "detection.min_finite_fraction",
        "detection.clip_low_percentile",
        "detection.clip_high_percentile",
        "detection.clip_min_finite",
        "detection.smoothing_target_depth",
        "detection.smoothing_window_min",
        "detection.smoothing_window_max",
        "detection.min_run_depth",
        "detection.min_run_floor",
        "detection.merge_gap_depth",
        "detection.merge_gap_floor",
        "detection.level_weight",
        "detection.slope_weight",
        "detection.threshold_floor",
        "detection.threshold_percentile",
        "detection.severity_percentile",
        "detection.severity_scale",
        // [consolidation]
        "consolidation",
        "consolidation.agreement_boost",
        "consolidation.iou_threshold",
        "consolidation.min_center_separation",
        "consolidation.max_findings",
        "consolidation.stability_center_tolerance",
        // [llm]
        "llm",
        "llm.groq_api_key",
        "llm.openai_api_key",
        "llm.preferred_model",
        "llm.timeout_secs",
        "llm.max_retries",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// Key Paths
// ============================================================================

/// Dotted paths of every key in `value`, tables included, in key order.
///
/// `[llm]\ntimeout_secs = 5` yields `["llm", "llm.timeout_secs"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };
    table
        .iter()
        .flat_map(|(name, child)| {
            let path = match prefix {
                "" => name.clone(),
                _ => format!("{prefix}.{name}"),
            };
            let nested = walk_toml_keys(child, &path);
            std::iter::once(path).chain(nested)
        })
        .collect()
}

// ============================================================================
// Suggestions
// ============================================================================

/// Edit distance over chars, single-row dynamic programming.
fn levenshtein(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=target.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in target.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[target.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Warnings for every key in `raw_toml` the config does not define.
///
/// Unparsable input yields no warnings; the typed parse reports it.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };
    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

fn check_unit_interval(value: f64, name: &str, errors: &mut Vec<String>) {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        errors.push(format!("{name} = {value} must be within [0, 1]"));
    }
}

fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(format!("{name} = {value} must be a positive finite number"));
    }
}

fn check_percentile_pair(low: f64, high: f64, name: &str, errors: &mut Vec<String>) {
    if !low.is_finite() || !high.is_finite() {
        errors.push(format!(
            "{name}: percentiles must be finite (got low={low}, high={high})"
        ));
        return;
    }
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
        errors.push(format!(
            "{name}: expected 0 <= low ({low:.1}) < high ({high:.1}) <= 100"
        ));
    }
}

/// Validate ranges on a parsed config. Returns every violation found.
pub fn validate_ranges(config: &WellscanConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let d = &config.detection;

    if d.min_rows < 2 {
        errors.push(format!("detection.min_rows = {} must be >= 2", d.min_rows));
    }
    check_unit_interval(d.min_finite_fraction, "detection.min_finite_fraction", &mut errors);
    check_percentile_pair(
        d.clip_low_percentile,
        d.clip_high_percentile,
        "detection.clip_percentiles",
        &mut errors,
    );
    check_positive(d.smoothing_target_depth, "detection.smoothing_target_depth", &mut errors);
    if d.smoothing_window_min == 0 || d.smoothing_window_min > d.smoothing_window_max {
        errors.push(format!(
            "detection.smoothing_window_min ({}) must be in 1..=smoothing_window_max ({})",
            d.smoothing_window_min, d.smoothing_window_max
        ));
    }
    check_positive(d.min_run_depth, "detection.min_run_depth", &mut errors);
    if d.min_run_floor == 0 {
        errors.push("detection.min_run_floor must be > 0".to_string());
    }
    check_positive(d.merge_gap_depth, "detection.merge_gap_depth", &mut errors);
    check_unit_interval(d.level_weight, "detection.level_weight", &mut errors);
    check_unit_interval(d.slope_weight, "detection.slope_weight", &mut errors);
    let weight_sum = d.level_weight + d.slope_weight;
    if !(0.95..=1.05).contains(&weight_sum) {
        errors.push(format!(
            "detection.level_weight + slope_weight must sum to ~1.0, got {weight_sum:.2}"
        ));
    }
    check_positive(d.threshold_floor, "detection.threshold_floor", &mut errors);
    check_percentile_pair(0.0, d.threshold_percentile, "detection.threshold_percentile", &mut errors);
    check_percentile_pair(0.0, d.severity_percentile, "detection.severity_percentile", &mut errors);
    check_positive(d.severity_scale, "detection.severity_scale", &mut errors);

    let c = &config.consolidation;
    if !c.agreement_boost.is_finite() || c.agreement_boost < 0.0 {
        errors.push(format!(
            "consolidation.agreement_boost = {} must be >= 0",
            c.agreement_boost
        ));
    }
    if !c.iou_threshold.is_finite() || c.iou_threshold <= 0.0 || c.iou_threshold > 1.0 {
        errors.push(format!(
            "consolidation.iou_threshold = {} must be within (0, 1]",
            c.iou_threshold
        ));
    }
    if !c.min_center_separation.is_finite() || c.min_center_separation < 0.0 {
        errors.push(format!(
            "consolidation.min_center_separation = {} must be >= 0",
            c.min_center_separation
        ));
    }
    if c.max_findings == 0 {
        errors.push("consolidation.max_findings must be > 0".to_string());
    }
    check_positive(
        c.stability_center_tolerance,
        "consolidation.stability_center_tolerance",
        &mut errors,
    );

    if config.llm.timeout_secs == 0 {
        errors.push("llm.timeout_secs must be > 0".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typo_in_detection_key_suggests_correction() {
        let warnings = validate_unknown_keys(
            r#"
[detection]
treshold_floor = 3.0
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("detection.threshold_floor")
        );
    }

    #[test]
    fn valid_keys_produce_no_warnings() {
        let warnings = validate_unknown_keys(
            r#"
[detection]
threshold_floor = 3.0

[consolidation]
max_findings = 5

[llm]
timeout_secs = 10
"#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn unrelated_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("completely_unrelated_section_name = 1\n");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].suggestion.is_none());
    }

    #[test]
    fn default_config_has_no_range_errors() {
        assert!(validate_ranges(&WellscanConfig::default()).is_empty());
    }

    #[test]
    fn inverted_clip_percentiles_are_rejected() {
        let mut cfg = WellscanConfig::default();
        cfg.detection.clip_low_percentile = 99.0;
        cfg.detection.clip_high_percentile = 1.0;
        let errors = validate_ranges(&cfg);
        assert!(errors.iter().any(|e| e.contains("clip_percentiles")));
    }

    #[test]
    fn unbalanced_weights_are_rejected() {
        let mut cfg = WellscanConfig::default();
        cfg.detection.level_weight = 0.9;
        cfg.detection.slope_weight = 0.9;
        let errors = validate_ranges(&cfg);
        assert!(errors.iter().any(|e| e.contains("sum to ~1.0")));
    }

    #[test]
    fn levenshtein_counts_edits() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
