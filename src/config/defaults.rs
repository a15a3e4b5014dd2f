//! System-wide default constants.
//!
//! Every tunable in [`super::WellscanConfig`] defaults to one of these values,
//! so an absent `wellscan.toml` reproduces the documented detector behavior.
//! Grouped by pipeline stage for easy discovery.

// ============================================================================
// Curve Preparation
// ============================================================================

/// Minimum rows (after sort + de-duplication) for a full analysis.
///
/// Fewer rows short-circuit to the low-confidence insufficient-data bundle.
pub const MIN_ANALYSIS_ROWS: usize = 20;

// ============================================================================
// Per-Curve Detection
// ============================================================================

/// Curves with fewer finite samples than this fraction are skipped.
pub const MIN_FINITE_FRACTION: f64 = 0.30;

/// Lower clip percentile applied before smoothing.
pub const CLIP_LOW_PERCENTILE: f64 = 1.0;

/// Upper clip percentile applied before smoothing.
pub const CLIP_HIGH_PERCENTILE: f64 = 99.0;

/// Curves with fewer finite values than this are never clipped.
pub const CLIP_MIN_FINITE: usize = 20;

/// Depth span (units) the smoothing window aims to cover.
pub const SMOOTHING_TARGET_DEPTH: f64 = 18.0;

/// Smallest smoothing window (samples).
pub const SMOOTHING_WINDOW_MIN: usize = 9;

/// Largest smoothing window (samples).
pub const SMOOTHING_WINDOW_MAX: usize = 121;

/// Depth span (units) a run must cover to survive.
pub const MIN_RUN_DEPTH: f64 = 6.0;

/// Minimum run length (samples) regardless of depth step.
pub const MIN_RUN_FLOOR: usize = 4;

/// Depth gap (units) bridged when merging same-shape runs.
pub const MERGE_GAP_DEPTH: f64 = 4.0;

/// Minimum merge gap (samples).
pub const MERGE_GAP_FLOOR: usize = 2;

/// Weight of the residual-level anomaly in the composite score.
pub const LEVEL_WEIGHT: f64 = 0.62;

/// Weight of the local-slope anomaly in the composite score.
pub const SLOPE_WEIGHT: f64 = 0.38;

/// Absolute floor of the adaptive threshold.
pub const THRESHOLD_FLOOR: f64 = 2.6;

/// Percentile of a curve's own scores used as its adaptive threshold.
pub const THRESHOLD_PERCENTILE: f64 = 92.0;

/// Percentile of a curve's scores feeding its severity proxy.
pub const SEVERITY_PERCENTILE: f64 = 95.0;

/// Divisor mapping the severity percentile score onto [0, 1].
pub const SEVERITY_SCALE: f64 = 7.0;

// ============================================================================
// Interval Consolidation
// ============================================================================

/// Score boost per unit of mean cross-curve agreement.
pub const AGREEMENT_BOOST: f64 = 0.35;

/// Intervals overlapping a kept finding at or above this IoU are dropped.
pub const IOU_THRESHOLD: f64 = 0.55;

/// Minimum distance (depth units) between kept finding centers.
pub const MIN_CENTER_SEPARATION: f64 = 22.0;

/// Maximum findings kept per analysis.
pub const MAX_FINDINGS: usize = 6;

/// Center distance (depth units) counted as a neighbor for stability.
pub const STABILITY_CENTER_TOLERANCE: f64 = 10.0;

// ============================================================================
// LLM Collaborator
// ============================================================================

/// Per-request timeout for the LLM provider (seconds).
pub const LLM_TIMEOUT_SECS: u64 = 45;

/// Retries after the first failed LLM request.
pub const LLM_MAX_RETRIES: u32 = 2;
