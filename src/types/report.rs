//! Deterministic report: global scores, data quality, curve statistics

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::IntervalFinding;

/// Ordinal global-risk label derived from the anomaly score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl SeverityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::Critical
        } else if score >= 0.50 {
            Self::High
        } else if score >= 0.25 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-quality band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityBand {
    Low,
    Medium,
    High,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.72 {
            Self::High
        } else if score >= 0.48 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for QualityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data-quality record per analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub null_fraction: f64,
    pub null_percent: f64,
    pub effective_rows: usize,
    pub depth_resolution_median: Option<f64>,
    pub clipped_fraction: f64,
    pub clipped_percent: f64,
    pub quality_band: QualityBand,
    pub warnings: Vec<String>,
    /// Curves skipped by the detector for being too sparse
    #[serde(default)]
    pub excluded_curves: Vec<String>,
}

/// Head-vs-tail trend of a curve's finite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    Insufficient,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
            Self::Insufficient => "insufficient",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive statistics of one curve over its finite samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub count: usize,
    pub p10: Option<f64>,
    pub p90: Option<f64>,
    pub trend: Trend,
    pub outlier_count: usize,
    pub outlier_pct: f64,
    pub usable_ratio: f64,
}

impl CurveStatistics {
    /// Record for a curve with no finite samples.
    pub fn empty() -> Self {
        Self {
            min: None,
            max: None,
            mean: None,
            std: None,
            count: 0,
            p10: None,
            p90: None,
            trend: Trend::Insufficient,
            outlier_count: 0,
            outlier_pct: 0.0,
            usable_ratio: 0.0,
        }
    }

    /// p90 - p10, when both are known.
    pub fn spread(&self) -> Option<f64> {
        match (self.p10, self.p90) {
            (Some(lo), Some(hi)) if lo.is_finite() && hi.is_finite() => Some(hi - lo),
            _ => None,
        }
    }
}

/// Curve statistics keyed by name, in caller curve order.
///
/// Serializes as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveStatisticsMap(Vec<(String, CurveStatistics)>);

impl CurveStatisticsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repeated name replaces the statistics but keeps its first position.
    pub fn insert(&mut self, name: String, stats: CurveStatistics) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = stats,
            None => self.0.push((name, stats)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CurveStatistics> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurveStatistics)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }
}

impl FromIterator<(String, CurveStatistics)> for CurveStatisticsMap {
    fn from_iter<I: IntoIterator<Item = (String, CurveStatistics)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, stats) in iter {
            map.insert(name, stats);
        }
        map
    }
}

impl Serialize for CurveStatisticsMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

struct CurveStatisticsVisitor;

impl<'de> Visitor<'de> for CurveStatisticsVisitor {
    type Value = CurveStatisticsMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of curve name to curve statistics")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = CurveStatisticsMap::new();
        while let Some((name, stats)) = access.next_entry::<String, CurveStatistics>()? {
            map.insert(name, stats);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for CurveStatisticsMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CurveStatisticsVisitor)
    }
}

// ============================================================================
// Fixed threshold documentation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScoreThresholds {
    pub low_to_moderate: f64,
    pub moderate_to_high: f64,
    pub high_to_critical: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalScoreThresholds {
    pub watch_to_elevated: f64,
    pub elevated_to_strong: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityBucketRules {
    pub high: String,
    pub medium: String,
    pub low: String,
}

/// Static description of the banding rules, echoed in every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdDocumentation {
    pub anomaly_score: AnomalyScoreThresholds,
    pub interval_score: IntervalScoreThresholds,
    pub probability_buckets: ProbabilityBucketRules,
}

impl Default for ThresholdDocumentation {
    fn default() -> Self {
        Self {
            anomaly_score: AnomalyScoreThresholds {
                low_to_moderate: 0.25,
                moderate_to_high: 0.50,
                high_to_critical: 0.75,
            },
            interval_score: IntervalScoreThresholds {
                watch_to_elevated: 3.0,
                elevated_to_strong: 5.0,
            },
            probability_buckets: ProbabilityBucketRules {
                high: "confidence>=0.80 AND score>=8.5".to_string(),
                medium: "confidence>=0.64 AND score>=5.5".to_string(),
                low: "otherwise".to_string(),
            },
        }
    }
}

// ============================================================================
// Deterministic report
// ============================================================================

/// The "deterministic" output bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterministicReport {
    pub model_version: String,
    pub event_count: usize,
    #[serde(rename = "eventDensityPer1000ft")]
    pub event_density_per_1000ft: f64,
    pub anomaly_score: f64,
    /// Legacy alias of `detection_confidence`
    pub confidence: f64,
    pub detection_confidence: f64,
    pub severity_confidence: f64,
    pub severity_band: SeverityBand,
    pub data_quality: DataQuality,
    pub curve_statistics: CurveStatisticsMap,
    pub thresholds: ThresholdDocumentation,
    pub summary: Vec<String>,
    pub summary_paragraph: String,
    pub interval_findings: Vec<IntervalFinding>,
    pub recommendations: Vec<String>,
    pub limitations: Vec<String>,
}
