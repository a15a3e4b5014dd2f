//! wellscan: Deterministic Well-Log Anomaly Screening
//!
//! Explainable anomaly detection over multi-curve, depth-indexed well-log
//! data. Every result is a pure function of the request and the config.
//!
//! ## Architecture
//!
//! - **Preparation**: depth-sorted, deduplicated curve arrays
//! - **Detector**: robust z-score + residual + gradient scoring per curve,
//!   adaptive windows, shape classification
//! - **Consolidation**: cross-curve merge, IoU dedup, priority ranking
//! - **Scoring**: global anomaly score, confidence, severity band, data quality
//! - **Narrative / Insight**: curve statistics, bullets, derived indices
//! - **LLM Module**: optional interpretation and chat on OpenAI-compatible
//!   providers, with deterministic fallbacks

pub mod config;
pub mod types;
pub mod stats;
pub mod preparation;
pub mod detector;
pub mod consolidation;
pub mod scoring;
pub mod narrative;
pub mod insight;
pub mod analysis;
pub mod llm;

// Re-export configuration
pub use config::{ConfigError, WellscanConfig};

// Re-export the analysis entry point
pub use analysis::analyze;

// Re-export commonly used types
pub use types::{
    AnalysisOutput, AnalysisRequest, CurveStatistics, CurveStatisticsMap, DataQuality, DeterministicReport, Insight,
    IntervalFinding, IntervalShape, InterpretEnvelope, LogRow, SeverityBand, MODEL_VERSION,
};

// Re-export LLM components
pub use llm::{
    chat_with_data, fallback_interpretation, interpret_with_fallback, ChatContext, ChatReply,
    InterpretationContext, InterpretationOutcome, LlmBackend, ProviderHandle, ProviderSettings,
};
