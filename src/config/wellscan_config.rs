//! Wellscan Configuration - detector and consolidator tunables as TOML values
//!
//! Each struct implements `Default` with values from [`super::defaults`],
//! ensuring documented behavior when no config file is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults::*;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WELLSCAN_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "wellscan.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `WellscanConfig::load()` which searches:
/// 1. `$WELLSCAN_CONFIG` env var
/// 2. `./wellscan.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellscanConfig {
    /// Per-curve detector tunables
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Interval consolidation tunables
    #[serde(default)]
    pub consolidation: ConsolidationConfig,

    /// LLM provider settings (keys may be overridden by env vars)
    #[serde(default)]
    pub llm: LlmConfig,
}

impl WellscanConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from WELLSCAN_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from WELLSCAN_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "WELLSCAN_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./wellscan.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./wellscan.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./wellscan.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No wellscan.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only warn; range violations fail.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Copy with API keys masked, for display.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        for key in [&mut out.llm.groq_api_key, &mut out.llm.openai_api_key] {
            if !key.is_empty() {
                *key = "***".to_string();
            }
        }
        out
    }

    /// Validate all tunables for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Per-curve anomaly detector tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_rows: usize,
    pub min_finite_fraction: f64,
    pub clip_low_percentile: f64,
    pub clip_high_percentile: f64,
    pub clip_min_finite: usize,
    pub smoothing_target_depth: f64,
    pub smoothing_window_min: usize,
    pub smoothing_window_max: usize,
    pub min_run_depth: f64,
    pub min_run_floor: usize,
    pub merge_gap_depth: f64,
    pub merge_gap_floor: usize,
    pub level_weight: f64,
    pub slope_weight: f64,
    pub threshold_floor: f64,
    pub threshold_percentile: f64,
    pub severity_percentile: f64,
    pub severity_scale: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_rows: MIN_ANALYSIS_ROWS,
            min_finite_fraction: MIN_FINITE_FRACTION,
            clip_low_percentile: CLIP_LOW_PERCENTILE,
            clip_high_percentile: CLIP_HIGH_PERCENTILE,
            clip_min_finite: CLIP_MIN_FINITE,
            smoothing_target_depth: SMOOTHING_TARGET_DEPTH,
            smoothing_window_min: SMOOTHING_WINDOW_MIN,
            smoothing_window_max: SMOOTHING_WINDOW_MAX,
            min_run_depth: MIN_RUN_DEPTH,
            min_run_floor: MIN_RUN_FLOOR,
            merge_gap_depth: MERGE_GAP_DEPTH,
            merge_gap_floor: MERGE_GAP_FLOOR,
            level_weight: LEVEL_WEIGHT,
            slope_weight: SLOPE_WEIGHT,
            threshold_floor: THRESHOLD_FLOOR,
            threshold_percentile: THRESHOLD_PERCENTILE,
            severity_percentile: SEVERITY_PERCENTILE,
            severity_scale: SEVERITY_SCALE,
        }
    }
}

// ============================================================================
// Consolidation
// ============================================================================

/// Interval merge / suppression / separation tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    pub agreement_boost: f64,
    pub iou_threshold: f64,
    pub min_center_separation: f64,
    pub max_findings: usize,
    pub stability_center_tolerance: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            agreement_boost: AGREEMENT_BOOST,
            iou_threshold: IOU_THRESHOLD,
            min_center_separation: MIN_CENTER_SEPARATION,
            max_findings: MAX_FINDINGS,
            stability_center_tolerance: STABILITY_CENTER_TOLERANCE,
        }
    }
}

// ============================================================================
// LLM Provider
// ============================================================================

/// LLM provider settings. Env vars `GROQ_API_KEY`, `OPENAI_API_KEY` and
/// `LLM_PRIMARY` take precedence over these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub groq_api_key: String,
    pub openai_api_key: String,
    pub preferred_model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            openai_api_key: String::new(),
            preferred_model: String::new(),
            timeout_secs: LLM_TIMEOUT_SECS,
            max_retries: LLM_MAX_RETRIES,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = WellscanConfig::default();
        assert_eq!(cfg.detection.min_rows, 20);
        assert!((cfg.detection.threshold_floor - 2.6).abs() < 1e-12);
        assert!((cfg.consolidation.iou_threshold - 0.55).abs() < 1e-12);
        assert_eq!(cfg.consolidation.max_findings, 6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg = WellscanConfig::from_toml_str(
            r#"
[consolidation]
max_findings = 4
"#,
        )
        .unwrap();
        assert_eq!(cfg.consolidation.max_findings, 4);
        assert_eq!(cfg.detection, DetectionConfig::default());
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let mut cfg = WellscanConfig::default();
        cfg.detection.threshold_floor = 3.1;
        let text = cfg.to_toml().unwrap();
        let back = WellscanConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn redacted_masks_keys() {
        let mut cfg = WellscanConfig::default();
        cfg.llm.groq_api_key = "gsk_abcdefghijklmnopqrstuvwxyz".to_string();
        let shown = cfg.redacted();
        assert_eq!(shown.llm.groq_api_key, "***");
        assert!(shown.llm.openai_api_key.is_empty());
    }

    #[test]
    fn invalid_range_is_rejected() {
        let err = WellscanConfig::from_toml_str(
            r#"
[consolidation]
iou_threshold = 1.5
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
