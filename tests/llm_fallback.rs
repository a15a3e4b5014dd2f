//! LLM Fallback Integration Tests
//!
//! Exercises the interpretation and chat paths end to end with local stub
//! backends. No network access; every failure mode must degrade to the
//! deterministic fallback rather than an error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use wellscan::config::LlmConfig;
use wellscan::llm::{ChatRequest, InterpretationSource, LlmError};
use wellscan::{
    chat_with_data, interpret_with_fallback, AnalysisRequest, ChatContext, InterpretationContext,
    LlmBackend, LogRow, ProviderHandle, ProviderSettings,
};

// ============================================================================
// Stub backend
// ============================================================================

struct Scripted {
    reply: Option<&'static str>,
    calls: AtomicUsize,
}

impl Scripted {
    fn replying(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmBackend for Scripted {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .map(str::to_string)
            .ok_or(LlmError::EmptyCompletion)
    }

    fn provider_name(&self) -> &str {
        "SCRIPTED"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

fn gas_request() -> AnalysisRequest {
    let rows = (0..40)
        .map(|i| {
            let depth = 1500.0 + f64::from(i);
            let bump = if (18..24).contains(&i) { 400.0 } else { 0.0 };
            LogRow::new(depth)
                .with("C1", Some(800.0 + 5.0 * f64::from(i % 4) + bump))
                .with("C2", Some(90.0 + f64::from(i % 3) + bump / 10.0))
        })
        .collect();
    AnalysisRequest {
        well_id: "GAS-7".into(),
        from_depth: 1500.0,
        to_depth: 1539.0,
        curves: vec!["C1".into(), "C2".into()],
        rows,
    }
}

// ============================================================================
// Interpretation
// ============================================================================

#[test]
fn interpretation_without_provider_uses_fallback() {
    let ctx = InterpretationContext::from_request(&gas_request());
    let outcome = tokio_test::block_on(interpret_with_fallback(None, &ctx));
    assert_eq!(outcome.source, InterpretationSource::Fallback);
    assert_eq!(outcome.provider, "NONE");
    assert!(outcome.model.is_none());
    assert_eq!(outcome.error.as_deref(), Some("No LLM provider is configured"));
    assert!(!outcome.interpretation.summary.is_empty());
    assert!(!outcome.interpretation.recommendations.is_empty());
}

#[test]
fn prose_reply_falls_back_and_keeps_provenance() {
    let backend = Scripted::replying("I could not produce JSON for this interval, sorry.");
    let handle = ProviderHandle::with_backend(backend.clone(), "test");
    let ctx = InterpretationContext::from_request(&gas_request());

    let outcome = tokio_test::block_on(interpret_with_fallback(Some(&handle), &ctx));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.source, InterpretationSource::Fallback);
    assert_eq!(outcome.provider, "SCRIPTED");
    assert_eq!(outcome.model.as_deref(), Some("scripted-1"));
    assert_eq!(
        outcome.error.as_deref(),
        Some("No JSON object found in model output")
    );
}

#[test]
fn fenced_json_reply_is_accepted() {
    let backend = Scripted::replying(
        "```json\n{\"summary\": \"Gas peak near 1520 m.\", \"fluid_type\": \"Dry gas\"}\n```",
    );
    let handle = ProviderHandle::with_backend(backend, "test");
    let ctx = InterpretationContext::from_request(&gas_request());

    let outcome = tokio_test::block_on(interpret_with_fallback(Some(&handle), &ctx));
    assert_eq!(outcome.source, InterpretationSource::Llm);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.interpretation.summary, "Gas peak near 1520 m.");
    assert_eq!(outcome.interpretation.fluid_type, "Dry gas");
    assert!(outcome.interpretation.zones.is_empty());
}

#[test]
fn all_null_request_gets_insufficient_data_interpretation() {
    let mut request = gas_request();
    for row in &mut request.rows {
        row.values.values_mut().for_each(|v| *v = None);
    }
    let ctx = InterpretationContext::from_request(&request);
    let outcome = tokio_test::block_on(interpret_with_fallback(None, &ctx));
    let interp = &outcome.interpretation;
    assert_eq!(interp.fluid_type, "insufficient data");
    assert_eq!(
        interp.summary,
        "No valid numeric samples were found in 1500.0-1539.0 for well 'GAS-7'."
    );
    assert!(interp.gas_shows.is_empty());
}

// ============================================================================
// Chat
// ============================================================================

#[test]
fn chat_without_provider_returns_notice() {
    let ctx = ChatContext::new("GAS-7", 1500.0, 1539.0);
    let reply = tokio_test::block_on(chat_with_data(None, &ctx));
    assert!(!reply.llm_used);
    assert_eq!(reply.source, "fallback");
    assert_eq!(reply.provider, "NONE");
    assert_eq!(reply.llm_error.as_deref(), Some("client_not_configured"));
    assert!(reply.answer.contains("GROQ_API_KEY"));
}

#[test]
fn chat_backend_failure_names_provider() {
    let handle = ProviderHandle::with_backend(Scripted::failing(), "test");
    let ctx = ChatContext::new("GAS-7", 1500.0, 1539.0);
    let reply = tokio_test::block_on(chat_with_data(Some(&handle), &ctx));
    assert!(!reply.llm_used);
    assert_eq!(
        reply.answer,
        "AI chat is unavailable due to a SCRIPTED API error."
    );
    assert!(reply.llm_error.is_some());
}

// ============================================================================
// Provider handle lifecycle
// ============================================================================

fn settings_with_model(model: &str) -> ProviderSettings {
    let cfg = LlmConfig {
        preferred_model: model.to_string(),
        ..LlmConfig::default()
    };
    ProviderSettings::from_config(&cfg)
}

#[test]
fn refresh_keeps_handle_while_signature_matches() {
    let settings = settings_with_model("model-a");
    let handle = ProviderHandle::with_backend(Scripted::failing(), settings.signature());
    let kept = handle
        .refresh(&settings)
        .expect("unchanged settings keep the handle");
    assert_eq!(kept.provider_name(), "SCRIPTED");
}

#[test]
fn refresh_rebuilds_when_settings_change() {
    let before = settings_with_model("model-a");
    let handle = ProviderHandle::with_backend(Scripted::failing(), before.signature());
    let after = settings_with_model("model-b");
    assert!(!handle.is_valid_for(&after));
    // No usable key in the defaults, so the rebuild yields nothing.
    assert!(handle.refresh(&after).is_none());
}
