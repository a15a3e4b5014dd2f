//! LLM interpretation with deterministic fallback
//!
//! `interpret_with_fallback` never fails: a missing handle, transport error,
//! unparsable or off-schema output all substitute the fallback interpreter
//! and record why.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::fallback::fallback_interpretation;
use super::parsing::{parse_interpretation, Interpretation};
use super::prompt::{interpretation_request, InterpretationContext};
use super::provider::ProviderHandle;
use super::LlmError;

/// Which path produced an interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationSource {
    Llm,
    Fallback,
}

/// Interpretation plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationOutcome {
    pub interpretation: Interpretation,
    pub source: InterpretationSource,
    pub provider: String,
    pub model: Option<String>,
    pub error: Option<String>,
}

impl InterpretationOutcome {
    fn fallback(
        ctx: &InterpretationContext,
        handle: Option<&ProviderHandle>,
        error: &LlmError,
    ) -> Self {
        Self {
            interpretation: fallback_interpretation(ctx),
            source: InterpretationSource::Fallback,
            provider: handle
                .map_or_else(|| "NONE".to_string(), |h| h.provider_name().to_string()),
            model: handle.map(|h| h.model_name().to_string()),
            error: Some(error.to_string()),
        }
    }
}

async fn interpret(
    handle: &ProviderHandle,
    ctx: &InterpretationContext,
) -> Result<Interpretation, LlmError> {
    let request = interpretation_request(ctx);
    let text = handle.backend().complete(&request).await?;
    parse_interpretation(text.trim())
}

/// Interpret `ctx` with the LLM when a handle is available, falling back to
/// the deterministic interpreter otherwise.
pub async fn interpret_with_fallback(
    handle: Option<&ProviderHandle>,
    ctx: &InterpretationContext,
) -> InterpretationOutcome {
    let Some(h) = handle else {
        info!(well = %ctx.well_name, "No LLM provider configured, using fallback interpretation");
        return InterpretationOutcome::fallback(ctx, None, &LlmError::NotConfigured);
    };

    match interpret(h, ctx).await {
        Ok(interpretation) => {
            info!(
                well = %ctx.well_name,
                provider = h.provider_name(),
                model = h.model_name(),
                "LLM interpretation complete"
            );
            InterpretationOutcome {
                interpretation,
                source: InterpretationSource::Llm,
                provider: h.provider_name().to_string(),
                model: Some(h.model_name().to_string()),
                error: None,
            }
        }
        Err(e) => {
            warn!(
                well = %ctx.well_name,
                provider = h.provider_name(),
                error = %e,
                "LLM interpretation failed, using fallback"
            );
            InterpretationOutcome::fallback(ctx, Some(h), &e)
        }
    }
}
