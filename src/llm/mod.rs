//! LLM Collaborator Module
//!
//! Optional narrative layer on top of the deterministic analysis. Nothing in
//! the analytic core depends on it.
//!
//! ## Architecture
//!
//! - **LlmBackend**: async chat-completion trait; `OpenAiCompatBackend` talks
//!   to any OpenAI-compatible endpoint (Groq, OpenAI)
//! - **ProviderHandle**: explicitly built from settings, valid only while the
//!   key/model signature is unchanged
//! - **Interpreter**: prompt + JSON extraction + schema check, falling back to
//!   a deterministic interpretation on any failure
//! - **Chat**: conversational answers grounded in a well summary and data
//!   context, with fixed fallback notices when no backend is usable

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod chat;
pub mod fallback;
pub mod interpreter;
pub mod openai_compat;
pub mod parsing;
pub mod prompt;
pub mod provider;

pub use chat::{chat_with_data, ChatContext, ChatReply};
pub use fallback::fallback_interpretation;
pub use interpreter::{interpret_with_fallback, InterpretationOutcome, InterpretationSource};
pub use openai_compat::OpenAiCompatBackend;
pub use parsing::{extract_json_object, parse_interpretation, Interpretation};
pub use prompt::{CurveSummaryStats, InterpretationContext};
pub use provider::{is_placeholder_key, Provider, ProviderHandle, ProviderSettings};

/// LLM errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {status}: {body}")]
    ServerError {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Completion contained no message content")]
    EmptyCompletion,
    #[error("No JSON object found in model output")]
    MalformedJson,
    #[error("Model output does not match the interpretation schema: {0}")]
    Schema(#[from] serde_json::Error),
    #[error("No LLM provider is configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A chat-completion request, independent of the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one chat completion and return the message text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Provider label for logging and reply metadata
    fn provider_name(&self) -> &str;

    /// Model identifier sent with each request
    fn model_name(&self) -> &str;
}
