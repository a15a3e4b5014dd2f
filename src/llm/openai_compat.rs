//! OpenAI-compatible chat-completion backend
//!
//! Groq and OpenAI share the `/chat/completions` wire format, so one client
//! covers both. Transport errors, 5xx and rate limiting are retried with
//! exponential backoff; exhausted quota and other 4xx are returned at once.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::Provider;
use super::{ChatMessage, ChatRequest, LlmBackend, LlmError};

/// Initial retry delay (doubles each attempt).
const INITIAL_RETRY_DELAY_MS: u64 = 500;

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for one provider/model pair
#[derive(Clone)]
pub struct OpenAiCompatBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    provider: Provider,
    max_retries: u32,
}

impl OpenAiCompatBackend {
    /// Create a backend against the provider's default base URL.
    pub fn new(
        provider: Provider,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        Self::with_base_url(
            provider,
            provider.base_url(),
            api_key,
            model,
            timeout_secs,
            max_retries,
        )
    }

    /// Create a backend against an explicit base URL (proxies, local gateways).
    pub fn with_base_url(
        provider: Provider,
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            provider,
            max_retries,
        })
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::ServerError { status, body });
        }

        let parsed: CompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyCompletion)
    }
}

/// Whether a failed attempt is worth repeating.
fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(e) => !e.is_builder(),
        LlmError::ServerError { status, body } => {
            if body.to_lowercase().contains("insufficient_quota") {
                return false;
            }
            status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(request).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    let delay_ms = INITIAL_RETRY_DELAY_MS * 2u64.saturating_pow(attempt - 1);
                    tracing::warn!(
                        provider = %self.provider,
                        attempt = attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "LLM request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn provider_name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn server_error(status: StatusCode, body: &str) -> LlmError {
        LlmError::ServerError {
            status,
            body: body.into(),
        }
    }

    #[test]
    fn endpoint_joins_base_url() {
        let backend = OpenAiCompatBackend::with_base_url(
            Provider::OpenAi,
            "http://localhost:8080/v1/",
            "key",
            "gpt-4o",
            5,
            0,
        )
        .unwrap();
        assert_eq!(backend.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(backend.provider_name(), "OPENAI");
        assert_eq!(backend.model_name(), "gpt-4o");
    }

    #[test]
    fn retry_policy() {
        assert!(is_retryable(&server_error(StatusCode::BAD_GATEWAY, "")));
        assert!(is_retryable(&server_error(StatusCode::TOO_MANY_REQUESTS, "slow down")));
        assert!(!is_retryable(&server_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":"insufficient_quota"}}"#
        )));
        assert!(!is_retryable(&server_error(StatusCode::UNAUTHORIZED, "")));
        assert!(!is_retryable(&LlmError::EmptyCompletion));
    }

    #[test]
    fn completion_body_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = CompletionBody {
            model: "m",
            messages: &messages,
            temperature: 0.45,
            max_tokens: 3000,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "u");
        assert_eq!(v["max_tokens"], 3000);
    }

    #[test]
    fn response_without_choices_parses() {
        let parsed: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
