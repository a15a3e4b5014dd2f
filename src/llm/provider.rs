//! Provider selection and handle lifecycle
//!
//! A `ProviderHandle` is built explicitly from `ProviderSettings` and carries
//! the `groq|openai|model` signature it was built from. It stays valid only
//! for settings with the same signature; `refresh` rebuilds otherwise.

use std::env;
use std::sync::Arc;

use tracing::{info, warn};

use super::{LlmBackend, OpenAiCompatBackend};
use crate::config::LlmConfig;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

/// Keys shorter than this are treated as unset.
const MIN_KEY_LEN: usize = 20;

/// Hosted provider behind a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "GROQ",
            Self::OpenAi => "OPENAI",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Groq => GROQ_BASE_URL,
            Self::OpenAi => OPENAI_BASE_URL,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Groq => GROQ_DEFAULT_MODEL,
            Self::OpenAi => OPENAI_DEFAULT_MODEL,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True for empty, template or obviously truncated API keys.
pub fn is_placeholder_key(key: &str) -> bool {
    key.is_empty()
        || key.contains("your_key")
        || key.contains("sk-proj-XXX")
        || key.len() < MIN_KEY_LEN
}

/// Resolved provider credentials and transport limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub groq_api_key: String,
    pub openai_api_key: String,
    /// Overrides the provider's default model when non-empty
    pub preferred_model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl ProviderSettings {
    /// Settings from the `[llm]` config section, values trimmed.
    pub fn from_config(cfg: &LlmConfig) -> Self {
        Self {
            groq_api_key: cfg.groq_api_key.trim().to_string(),
            openai_api_key: cfg.openai_api_key.trim().to_string(),
            preferred_model: cfg.preferred_model.trim().to_string(),
            timeout_secs: cfg.timeout_secs,
            max_retries: cfg.max_retries,
        }
    }

    /// Config values overridden by `GROQ_API_KEY`, `OPENAI_API_KEY` and
    /// `LLM_PRIMARY` when those are set and non-empty.
    pub fn from_env(cfg: &LlmConfig) -> Self {
        let mut settings = Self::from_config(cfg);
        let read = |name: &str| {
            env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(v) = read("GROQ_API_KEY") {
            settings.groq_api_key = v;
        }
        if let Some(v) = read("OPENAI_API_KEY") {
            settings.openai_api_key = v;
        }
        if let Some(v) = read("LLM_PRIMARY") {
            settings.preferred_model = v;
        }
        settings
    }

    /// Configuration signature used for handle invalidation.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}",
            self.groq_api_key, self.openai_api_key, self.preferred_model
        )
    }

    /// Provider and model these settings select, if any key is usable.
    ///
    /// Groq wins over OpenAI when both keys are usable.
    pub fn select(&self) -> Option<(Provider, String, &str)> {
        let (provider, key) = if !is_placeholder_key(&self.groq_api_key) {
            (Provider::Groq, self.groq_api_key.as_str())
        } else if !is_placeholder_key(&self.openai_api_key) {
            (Provider::OpenAi, self.openai_api_key.as_str())
        } else {
            return None;
        };
        let model = if self.preferred_model.is_empty() {
            provider.default_model().to_string()
        } else {
            self.preferred_model.clone()
        };
        Some((provider, model, key))
    }
}

/// A ready backend plus the signature of the settings it was built from.
#[derive(Clone)]
pub struct ProviderHandle {
    backend: Arc<dyn LlmBackend>,
    signature: String,
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("provider", &self.backend.provider_name())
            .field("model", &self.backend.model_name())
            .finish()
    }
}

impl ProviderHandle {
    /// Build a handle for the first usable provider, `None` when no key is
    /// usable or the HTTP client cannot be built.
    pub fn build(settings: &ProviderSettings) -> Option<Self> {
        let (provider, model, key) = settings.select()?;
        match OpenAiCompatBackend::new(
            provider,
            key,
            &model,
            settings.timeout_secs,
            settings.max_retries,
        ) {
            Ok(backend) => {
                info!(provider = %provider, model = %model, "LLM provider online");
                Some(Self {
                    backend: Arc::new(backend),
                    signature: settings.signature(),
                })
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Failed to build LLM client");
                None
            }
        }
    }

    /// Wrap an existing backend, e.g. a local stub.
    pub fn with_backend(backend: Arc<dyn LlmBackend>, signature: impl Into<String>) -> Self {
        Self {
            backend,
            signature: signature.into(),
        }
    }

    /// True when built from settings with this signature.
    pub fn is_valid_for(&self, settings: &ProviderSettings) -> bool {
        self.signature == settings.signature()
    }

    /// Keep this handle if the signature still matches, otherwise rebuild.
    pub fn refresh(self, settings: &ProviderSettings) -> Option<Self> {
        if self.is_valid_for(settings) {
            Some(self)
        } else {
            info!("LLM settings changed, rebuilding provider handle");
            Self::build(settings)
        }
    }

    pub fn backend(&self) -> &dyn LlmBackend {
        self.backend.as_ref()
    }

    pub fn provider_name(&self) -> &str {
        self.backend.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}
