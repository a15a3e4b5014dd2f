//! Insight bundle: derived indices, fluid label, risk profile, zones

use serde::{Deserialize, Serialize};

use super::Probability;

/// Screening indices for the first two selected curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightIndices {
    #[serde(rename = "wetnessIndexWh")]
    pub wetness_index: f64,
    #[serde(rename = "balanceRatioBh")]
    pub balance_ratio: Option<f64>,
    #[serde(rename = "characterRatioCh")]
    pub character_ratio: Option<f64>,
    #[serde(rename = "wetnessText")]
    pub wetness_text: String,
    #[serde(rename = "balanceText")]
    pub balance_text: String,
    #[serde(rename = "characterText")]
    pub character_text: String,
}

/// Heuristic fluid label. Never a certified petrophysical classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FluidLabel {
    #[serde(rename = "Oil-prone (inferred)")]
    OilProne,
    #[serde(rename = "Mixed hydrocarbon signal")]
    MixedSignal,
    #[serde(rename = "Gas-show possible")]
    GasShowPossible,
    #[serde(rename = "Weak fluid indication")]
    Weak,
}

impl FluidLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OilProne => "Oil-prone (inferred)",
            Self::MixedSignal => "Mixed hydrocarbon signal",
            Self::GasShowPossible => "Gas-show possible",
            Self::Weak => "Weak fluid indication",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryFluid {
    pub label: FluidLabel,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

/// Finding summary echoed in the insight bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub from_depth: f64,
    pub to_depth: f64,
    pub probability: Probability,
    pub reason: String,
    pub stability: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub seal_integrity: RiskLevel,
    pub saturation_risk: RiskLevel,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneLabel {
    #[serde(rename = "High activity zone")]
    HighActivity,
    #[serde(rename = "Transitional zone")]
    Transitional,
    #[serde(rename = "Relatively stable zone")]
    RelativelyStable,
}

impl ZoneLabel {
    /// Label from the fraction of findings overlapping a zone.
    pub fn from_overlap(fraction: f64) -> Self {
        if fraction >= 0.6 {
            Self::HighActivity
        } else if fraction >= 0.3 {
            Self::Transitional
        } else {
            Self::RelativelyStable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightZone {
    pub name: String,
    pub from_depth: f64,
    pub to_depth: f64,
    pub label: ZoneLabel,
    pub notes: String,
}

/// The "insight" output bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub well: String,
    pub from_depth: f64,
    pub to_depth: f64,
    pub analyzed_curves: Vec<String>,
    pub indices: InsightIndices,
    pub primary_fluid: PrimaryFluid,
    pub shows: Vec<Show>,
    pub risk_profile: RiskProfile,
    pub zones: Vec<InsightZone>,
    pub summary_paragraph: String,
}
