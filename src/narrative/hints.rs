//! Curve-name heuristics for domain-flavored one-liners
//!
//! Curve names are reduced to an alphanumeric tag (uppercased, anything
//! after a `__` suffix dropped) and matched by prefix against the common
//! log mnemonics. Unknown curves get a neutral line.

use crate::types::CurveStatistics;

/// Curve families recognized by tag prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveFamily {
    GammaRay,
    Density,
    Porosity,
    Resistivity,
}

impl CurveFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GammaRay => "gamma-ray",
            Self::Density => "density",
            Self::Porosity => "porosity",
            Self::Resistivity => "resistivity",
        }
    }
}

const GAMMA_PREFIXES: &[&str] = &["GR", "GAMMA"];
const DENSITY_PREFIXES: &[&str] = &["RHOB", "DEN"];
const POROSITY_PREFIXES: &[&str] = &["NPHI", "PHIT", "PHI"];
const RESISTIVITY_PREFIXES: &[&str] = &["RES", "RT", "ILD", "LLD", "MSFL"];

/// Uppercased alphanumeric tag of a curve name, `__` suffix dropped.
///
/// `"gr__norm"` -> `"GR"`, `"RHOB-1"` -> `"RHOB1"`.
pub fn curve_tag(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    let base = upper.split("__").next().unwrap_or("");
    base.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Family of a curve name, if it matches a known mnemonic prefix.
pub fn curve_family(name: &str) -> Option<CurveFamily> {
    let tag = curve_tag(name);
    let matches = |prefixes: &[&str]| prefixes.iter().any(|p| tag.starts_with(p));
    if matches(GAMMA_PREFIXES) {
        Some(CurveFamily::GammaRay)
    } else if matches(DENSITY_PREFIXES) {
        Some(CurveFamily::Density)
    } else if matches(POROSITY_PREFIXES) {
        Some(CurveFamily::Porosity)
    } else if matches(RESISTIVITY_PREFIXES) {
        Some(CurveFamily::Resistivity)
    } else {
        None
    }
}

/// One-line interpretation hint for a curve's statistics.
pub fn curve_interpretation(name: &str, stats: &CurveStatistics) -> String {
    let mean = stats.mean.filter(|v| v.is_finite());
    let p90 = stats.p90.filter(|v| v.is_finite());

    let line = match curve_family(name) {
        Some(CurveFamily::GammaRay) => match mean {
            Some(m) if m >= 100.0 => {
                "Gamma-ray response is high and may indicate shale-prone lithology."
            }
            Some(m) if m <= 50.0 => {
                "Gamma-ray response is low and may indicate cleaner sand/carbonate intervals."
            }
            _ => "Gamma-ray response is moderate, suggesting mixed lithology.",
        },
        Some(CurveFamily::Density) => match mean {
            Some(m) if m < 2.0 => {
                "Density is low and may indicate elevated porosity or gas effect."
            }
            Some(m) if m > 2.6 => "Density is high and may indicate tight or mineral-dense rock.",
            _ => "Density stays within a typical reservoir-range envelope.",
        },
        Some(CurveFamily::Porosity) => match mean {
            Some(m) if m > 0.25 => "Porosity index is elevated and may support reservoir quality.",
            Some(m) if m < 0.08 => "Porosity index is low, consistent with tighter intervals.",
            _ => "Porosity index is moderate in the selected depth window.",
        },
        Some(CurveFamily::Resistivity) => {
            if p90.is_some_and(|v| v >= 20.0) {
                "Higher-end resistivity values may indicate hydrocarbon charge or tighter zones."
            } else if mean.is_some_and(|m| m <= 2.0) {
                "Lower resistivity suggests more conductive intervals and possible water influence."
            } else {
                "Resistivity behavior is intermediate and should be checked with companion curves."
            }
        }
        None => {
            return format!(
                "Trend is {}; curve-specific domain interpretation requires metadata \
                 or companion curves for higher confidence.",
                stats.trend
            );
        }
    };
    line.to_string()
}
