//! Interval Consolidator
//!
//! Converts raw single-curve runs into the final, ranked finding list.
//!
//! ## Pipeline
//!
//! 1. **Merge**: runs sorted by start; a run joins the previous kept run when
//!    it starts within `merge_gap` samples of its end and has the same shape
//!    (end = max, score = max, curve set = union)
//! 2. **Boost**: score * (1 + 0.35 * mean agreement over the span), with
//!    confidence = clip(0.35 + 0.10 * ln(1 + boosted) + 0.18 * agreement)
//! 3. **Rank**: stable sort by boosted score, descending. The full ranking is
//!    kept for stability annotation
//! 4. **NMS**: greedily drop findings with IoU >= 0.55 against a kept one
//! 5. **Separation**: keep centers at least 22 depth units apart, at most 6
//! 6. **Annotate**: stability, priority and probability labels

use tracing::debug;

use crate::config::ConsolidationConfig;
use crate::detector::{mean_agreement, RawInterval};
use crate::stats::{clip, round_to};
use crate::types::{IntervalFinding, IntervalShape, Priority, Probability, Stability};

// ============================================================================
// Constants
// ============================================================================

/// Confidence floor and ceiling for a single finding.
const CONFIDENCE_MIN: f64 = 0.35;
const CONFIDENCE_MAX: f64 = 0.95;

/// Weight of ln(1 + boosted score) in finding confidence.
const CONFIDENCE_SCORE_WEIGHT: f64 = 0.10;

/// Weight of mean agreement in finding confidence.
const CONFIDENCE_AGREEMENT_WEIGHT: f64 = 0.18;

/// IoU denominator floor.
const IOU_EPS: f64 = 1e-9;

/// Stability composite weights: neighbors, width, agreement, curve support.
const STABILITY_WEIGHTS: [f64; 4] = [0.35, 0.30, 0.25, 0.10];

/// Saturation points of the stability components.
const STABILITY_NEIGHBOR_SATURATION: f64 = 4.0;
const STABILITY_WIDTH_SATURATION: f64 = 18.0;
const STABILITY_SUPPORT_SATURATION: f64 = 2.0;

// ============================================================================
// Candidate
// ============================================================================

/// A scored interval before suppression and annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub curve: String,
    pub from_depth: f64,
    pub to_depth: f64,
    pub confidence: f64,
    pub score: f64,
    pub shape: IntervalShape,
    pub curves_supporting: usize,
    pub width: f64,
    pub agreement: f64,
}

impl Candidate {
    pub fn center(&self) -> f64 {
        0.5 * (self.from_depth + self.to_depth)
    }
}

/// Intersection-over-union of two depth intervals.
pub fn interval_iou(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    let inter = (a1.min(b1) - a0.max(b0)).max(0.0);
    let union = a1.max(b1) - a0.min(b0) + IOU_EPS;
    inter / union
}

/// Composite stability score in [0, 1].
pub fn stability_score(neighbors: usize, width: f64, agreement: f64, curve_support: usize) -> f64 {
    let [w_nb, w_width, w_agree, w_support] = STABILITY_WEIGHTS;
    let score = w_nb * (neighbors as f64 / STABILITY_NEIGHBOR_SATURATION).min(1.0)
        + w_width * (width / STABILITY_WIDTH_SATURATION).min(1.0)
        + w_agree * agreement.min(1.0)
        + w_support * (curve_support as f64 / STABILITY_SUPPORT_SATURATION).min(1.0);
    clip(score, 0.0, 1.0)
}

// ============================================================================
// Consolidator
// ============================================================================

/// Interval merge / suppression / separation engine
pub struct IntervalConsolidator;

impl IntervalConsolidator {
    /// Full consolidation from raw runs to annotated findings.
    pub fn consolidate(
        raw: &[RawInterval],
        depths: &[f64],
        agreement: &[f64],
        merge_gap: usize,
        cfg: &ConsolidationConfig,
    ) -> Vec<IntervalFinding> {
        let merged = Self::merge(raw, merge_gap);
        let ranked = Self::rank(Self::to_candidates(&merged, depths, agreement, cfg));
        let kept = Self::suppress_overlaps(&ranked, cfg.iou_threshold);
        let kept = Self::enforce_separation(kept, cfg.min_center_separation, cfg.max_findings);

        debug!(
            raw = raw.len(),
            merged = merged.len(),
            ranked = ranked.len(),
            kept = kept.len(),
            "Intervals consolidated"
        );

        Self::annotate(&kept, &ranked, cfg.stability_center_tolerance)
    }

    /// Merge same-shape runs separated by at most `gap` samples.
    pub fn merge(raw: &[RawInterval], gap: usize) -> Vec<RawInterval> {
        let mut sorted: Vec<RawInterval> = raw.to_vec();
        sorted.sort_by_key(|r| r.start);

        let mut out: Vec<RawInterval> = Vec::with_capacity(sorted.len());
        for cur in sorted {
            match out.last_mut() {
                Some(prev) if cur.start <= prev.end + gap && cur.shape == prev.shape => {
                    prev.end = prev.end.max(cur.end);
                    prev.score = prev.score.max(cur.score);
                    for c in cur.curves {
                        if !prev.curves.contains(&c) {
                            prev.curves.push(c);
                        }
                    }
                    prev.curves.sort();
                }
                _ => out.push(cur),
            }
        }
        out
    }

    /// Agreement-boosted candidates with depth bounds and confidence.
    pub fn to_candidates(
        merged: &[RawInterval],
        depths: &[f64],
        agreement: &[f64],
        cfg: &ConsolidationConfig,
    ) -> Vec<Candidate> {
        merged
            .iter()
            .map(|it| {
                let avg_agree = mean_agreement(agreement, it.start, it.end);
                let boosted = it.score * (1.0 + cfg.agreement_boost * avg_agree);
                let confidence = clip(
                    CONFIDENCE_MIN
                        + CONFIDENCE_SCORE_WEIGHT * boosted.max(0.0).ln_1p()
                        + CONFIDENCE_AGREEMENT_WEIGHT * avg_agree,
                    CONFIDENCE_MIN,
                    CONFIDENCE_MAX,
                );

                let mut names = it.curves.clone();
                names.sort();
                let curve = names.join(",");
                let curves_supporting = curve.split(',').filter(|s| !s.trim().is_empty()).count();
                let from_depth = depths[it.start];
                let to_depth = depths[it.end];

                Candidate {
                    curve,
                    from_depth,
                    to_depth,
                    confidence: round_to(confidence, 3),
                    score: round_to(boosted, 3),
                    shape: it.shape,
                    curves_supporting,
                    width: round_to(to_depth - from_depth, 3),
                    agreement: round_to(avg_agree, 3),
                }
            })
            .collect()
    }

    /// Stable sort by score, descending.
    pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    /// Greedy interval non-max suppression over a ranked list.
    pub fn suppress_overlaps(ranked: &[Candidate], iou_threshold: f64) -> Vec<Candidate> {
        let mut kept: Vec<Candidate> = Vec::new();
        for c in ranked {
            let overlaps = kept.iter().any(|k| {
                interval_iou(c.from_depth, c.to_depth, k.from_depth, k.to_depth) >= iou_threshold
            });
            if !overlaps {
                kept.push(c.clone());
            }
        }
        kept
    }

    /// Keep candidates whose centers are at least `min_sep` from every kept
    /// center, stopping at `max_keep`.
    pub fn enforce_separation(
        candidates: Vec<Candidate>,
        min_sep: f64,
        max_keep: usize,
    ) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        for c in candidates {
            if out.len() >= max_keep {
                break;
            }
            let center = c.center();
            if out.iter().all(|k| (center - k.center()).abs() >= min_sep) {
                out.push(c);
            }
        }
        out
    }

    /// Attach stability, priority and probability labels.
    ///
    /// Neighbor counts use the full pre-suppression ranking, so a finding
    /// that absorbed many near-duplicates reads as more stable.
    pub fn annotate(
        kept: &[Candidate],
        all_ranked: &[Candidate],
        center_tolerance: f64,
    ) -> Vec<IntervalFinding> {
        kept.iter()
            .map(|c| {
                let center = c.center();
                let neighbors = all_ranked
                    .iter()
                    .filter(|r| (center - r.center()).abs() <= center_tolerance)
                    .count();
                let width = (c.to_depth - c.from_depth).max(0.0);
                let st = stability_score(neighbors, width, c.agreement, c.curves_supporting);

                IntervalFinding {
                    curve: c.curve.clone(),
                    from_depth: c.from_depth,
                    to_depth: c.to_depth,
                    confidence: c.confidence,
                    score: c.score,
                    reason: c.shape,
                    curves_supporting: c.curves_supporting,
                    width: c.width,
                    agreement: c.agreement,
                    stability: Stability::from_score(st),
                    stability_score: round_to(st, 3),
                    priority: Priority::from_score(c.score),
                    probability: Probability::bucket(c.score, c.confidence),
                }
            })
            .collect()
    }
}
