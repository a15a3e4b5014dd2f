//! Interval findings: shape, stability, priority and probability labels

use serde::{Deserialize, Serialize};

/// Shape of an anomalous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalShape {
    Spike,
    Drift,
    StepChange,
    NoisyZone,
}

impl IntervalShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spike => "spike",
            Self::Drift => "drift",
            Self::StepChange => "step_change",
            Self::NoisyZone => "noisy_zone",
        }
    }
}

impl std::fmt::Display for IntervalShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How well a finding is corroborated by its neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Stable,
    Moderate,
    Unstable,
}

impl Stability {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::Stable
        } else if score >= 0.52 {
            Self::Moderate
        } else {
            Self::Unstable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Moderate => "moderate",
            Self::Unstable => "unstable",
        }
    }
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review priority from the boosted interval score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Strong,
    Elevated,
    Watch,
}

impl Priority {
    pub fn from_score(score: f64) -> Self {
        if score > 5.0 {
            Self::Strong
        } else if score >= 3.0 {
            Self::Elevated
        } else {
            Self::Watch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Elevated => "elevated",
            Self::Watch => "watch",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screening probability bucket (model-based, not a fluid confirmation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Probability {
    High,
    Medium,
    Low,
}

impl Probability {
    /// Bucket a finding by its score and confidence.
    ///
    /// Non-finite inputs are treated as zero.
    pub fn bucket(score: f64, confidence: f64) -> Self {
        let s = if score.is_finite() { score } else { 0.0 };
        let c = if confidence.is_finite() { confidence } else { 0.0 };
        if c >= 0.80 && s >= 8.5 {
            Self::High
        } else if c >= 0.64 && s >= 5.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A consolidated, de-duplicated, separated anomalous depth interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalFinding {
    /// Supporting curve names, sorted and comma-joined
    pub curve: String,
    pub from_depth: f64,
    pub to_depth: f64,
    pub confidence: f64,
    /// Agreement-boosted interval score
    pub score: f64,
    pub reason: IntervalShape,
    pub curves_supporting: usize,
    pub width: f64,
    /// Mean cross-curve agreement over the interval
    pub agreement: f64,
    pub stability: Stability,
    pub stability_score: f64,
    pub priority: Priority,
    pub probability: Probability,
}

impl IntervalFinding {
    pub fn center(&self) -> f64 {
        0.5 * (self.from_depth + self.to_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_buckets_follow_thresholds() {
        assert_eq!(Probability::bucket(9.0, 0.85), Probability::High);
        assert_eq!(Probability::bucket(8.0, 0.85), Probability::Medium);
        assert_eq!(Probability::bucket(6.0, 0.64), Probability::Medium);
        assert_eq!(Probability::bucket(6.0, 0.60), Probability::Low);
        assert_eq!(Probability::bucket(f64::NAN, 0.9), Probability::Low);
    }

    #[test]
    fn priority_boundaries() {
        assert_eq!(Priority::from_score(5.0), Priority::Elevated);
        assert_eq!(Priority::from_score(5.01), Priority::Strong);
        assert_eq!(Priority::from_score(3.0), Priority::Elevated);
        assert_eq!(Priority::from_score(2.99), Priority::Watch);
    }

    #[test]
    fn shape_serializes_snake_case() {
        let s = serde_json::to_string(&IntervalShape::StepChange).unwrap();
        assert_eq!(s, "\"step_change\"");
        assert_eq!(
            serde_json::to_string(&Probability::Medium).unwrap(),
            "\"Medium\""
        );
    }
}
