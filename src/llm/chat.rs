//! Conversational endpoint
//!
//! Answers free-form questions grounded in a short well summary and a JSON
//! data context. The requested detail level (1..=5) scales the answer length,
//! bullet count, temperature and token budget. Without a usable backend the
//! reply is a fixed notice with `llm_used = false`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::provider::ProviderHandle;
use super::{ChatMessage, ChatRequest};
use crate::narrative::float_repr;
use crate::types::LogRow;

pub const DEFAULT_QUESTION: &str = "Give a concise technical summary.";
pub const DEFAULT_DETAIL_LEVEL: i64 = 3;

/// Rows copied into the data context.
const MAX_CONTEXT_ROWS: usize = 40;

const NOT_CONFIGURED_ANSWER: &str =
    "AI chatbot is not available. Please configure GROQ_API_KEY or OPENAI_API_KEY in backend/.env.";
const QUOTA_ANSWER: &str =
    "AI chat is unavailable because API quota is exhausted. Please check your API key and quota.";
const EMPTY_ANSWER: &str = "No response was generated.";

const CHAT_SYSTEM_PROMPT: &str = r#"You are a senior well-log analysis assistant for engineering users.

Use well_summary and data_context as the only trusted evidence source.

Behavior rules:
1. Prioritize question-specific context and focus analytics over generic summary.
2. Do not repeat the same template language across turns.
3. Do not restate full curve inventory unless user explicitly asks for it.
4. Provide the strongest data-backed finding first, then supporting evidence.
5. If user asks a broad question, still provide concrete ranked findings (top 2-3) rather than generic overview.
6. If evidence is weak, say exactly what is missing.

Answer style:
- First line: "Key finding: <direct conclusion>"
- Then {bullets} concise bullets with concrete numbers (depth, min/max, mean, trend, correlation).
- End with one line: "Action: <specific next analysis/check>".
- Keep answers sharp and technical; avoid filler.
- Target response length: {length} unless user explicitly asks otherwise.
- Respect requested detail level = {level} out of 5.

Well summary:
{well_summary}

Data context:
{data_context}
"#;

// ============================================================================
// Detail profiles
// ============================================================================

/// Length/bullet targets for one detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailProfile {
    pub level: u8,
    pub length: &'static str,
    pub bullets: &'static str,
}

impl DetailProfile {
    /// Profile for `level`, clamped to 1..=5.
    pub fn for_level(level: i64) -> Self {
        let level = level.clamp(1, 5) as u8;
        let (length, bullets) = match level {
            1 => ("80-120 words", "2 to 3"),
            2 => ("100-160 words", "3 to 4"),
            3 => ("120-220 words", "3 to 5"),
            4 => ("180-300 words", "4 to 6"),
            _ => ("240-420 words", "5 to 8"),
        };
        Self {
            level,
            length,
            bullets,
        }
    }

    pub fn temperature(&self) -> f64 {
        0.55 + f64::from(self.level) * 0.03
    }

    pub fn max_tokens(&self) -> u32 {
        900 + u32::from(self.level) * 350
    }
}

// ============================================================================
// Context
// ============================================================================

/// A question about one well interval plus the evidence to answer from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub well_id: String,
    pub from_depth: f64,
    pub to_depth: f64,
    #[serde(default)]
    pub curves: Vec<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub statistics: serde_json::Map<String, Value>,
    #[serde(default)]
    pub rows: Vec<LogRow>,
    #[serde(default)]
    pub evidence: serde_json::Map<String, Value>,
    #[serde(default = "default_detail_level", alias = "detail_level")]
    pub detail_level: i64,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

fn default_detail_level() -> i64 {
    DEFAULT_DETAIL_LEVEL
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DepthRange {
    from_depth: f64,
    to_depth: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataContext<'a> {
    well_id: &'a str,
    range: DepthRange,
    curves: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<&'a serde_json::Map<String, Value>>,
    #[serde(rename = "sample_rows", skip_serializing_if = "Option::is_none")]
    sample_rows: Option<&'a [LogRow]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evidence: Option<&'a serde_json::Map<String, Value>>,
}

impl ChatContext {
    pub fn new(well_id: impl Into<String>, from_depth: f64, to_depth: f64) -> Self {
        Self {
            well_id: well_id.into(),
            from_depth,
            to_depth,
            curves: Vec::new(),
            question: String::new(),
            statistics: serde_json::Map::new(),
            rows: Vec::new(),
            evidence: serde_json::Map::new(),
            detail_level: DEFAULT_DETAIL_LEVEL,
            history: Vec::new(),
        }
    }

    /// `Well=…, Interval=a-b, Curves=…`
    pub fn well_summary(&self) -> String {
        let curves = if self.curves.is_empty() {
            "n/a".to_string()
        } else {
            self.curves.join(", ")
        };
        format!(
            "Well={}, Interval={}-{}, Curves={curves}",
            self.well_id,
            float_repr(self.from_depth),
            float_repr(self.to_depth)
        )
    }

    /// Pretty JSON evidence block; empty sections are omitted.
    pub fn data_context(&self) -> String {
        let ctx = DataContext {
            well_id: &self.well_id,
            range: DepthRange {
                from_depth: self.from_depth,
                to_depth: self.to_depth,
            },
            curves: &self.curves,
            statistics: (!self.statistics.is_empty()).then_some(&self.statistics),
            sample_rows: (!self.rows.is_empty())
                .then(|| &self.rows[..self.rows.len().min(MAX_CONTEXT_ROWS)]),
            evidence: (!self.evidence.is_empty()).then_some(&self.evidence),
        };
        serde_json::to_string_pretty(&ctx).unwrap_or_else(|_| "{}".to_string())
    }

    fn question_or_default(&self) -> &str {
        let q = self.question.trim();
        if q.is_empty() {
            DEFAULT_QUESTION
        } else {
            q
        }
    }
}

/// System prompt for a detail profile.
pub fn system_prompt(profile: &DetailProfile, well_summary: &str, data_context: &str) -> String {
    CHAT_SYSTEM_PROMPT
        .replace("{bullets}", profile.bullets)
        .replace("{length}", profile.length)
        .replace("{level}", &profile.level.to_string())
        .replace("{well_summary}", well_summary)
        .replace("{data_context}", data_context)
}

/// Full message list: system prompt, replayed history, then the question.
pub fn chat_request(ctx: &ChatContext) -> ChatRequest {
    let profile = DetailProfile::for_level(ctx.detail_level);
    let mut messages = Vec::with_capacity(ctx.history.len() + 2);
    messages.push(ChatMessage::system(system_prompt(
        &profile,
        &ctx.well_summary(),
        &ctx.data_context(),
    )));
    messages.extend(ctx.history.iter().cloned());
    messages.push(ChatMessage::user(ctx.question_or_default()));

    ChatRequest {
        messages,
        temperature: profile.temperature(),
        max_tokens: profile.max_tokens(),
    }
}

// ============================================================================
// Reply
// ============================================================================

/// Answer plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    pub source: String,
    pub llm_used: bool,
    pub provider: String,
    pub model: Option<String>,
    pub llm_error: Option<String>,
}

fn blank_lines_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").ok()).as_ref()
}

fn inline_space_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]{2,}").ok()).as_ref()
}

/// Normalize line endings and collapse blank-line and whitespace runs.
pub fn clean_chat_text(text: &str) -> String {
    let mut cleaned = text.replace("\r\n", "\n").trim().to_string();
    if cleaned.is_empty() {
        return EMPTY_ANSWER.to_string();
    }
    if let Some(re) = blank_lines_re() {
        cleaned = re.replace_all(&cleaned, "\n\n").into_owned();
    }
    if let Some(re) = inline_space_re() {
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }
    cleaned
}

/// Answer `ctx.question`. Never fails: backend problems become notices.
pub async fn chat_with_data(handle: Option<&ProviderHandle>, ctx: &ChatContext) -> ChatReply {
    let Some(h) = handle else {
        return ChatReply {
            answer: NOT_CONFIGURED_ANSWER.to_string(),
            source: "fallback".to_string(),
            llm_used: false,
            provider: "NONE".to_string(),
            model: None,
            llm_error: Some("client_not_configured".to_string()),
        };
    };

    let provider = h.provider_name().to_string();
    let model = Some(h.model_name().to_string());
    let request = chat_request(ctx);

    match h.backend().complete(&request).await {
        Ok(text) => {
            info!(
                well = %ctx.well_id,
                provider = %provider,
                detail_level = ctx.detail_level,
                "Chat answer generated"
            );
            ChatReply {
                answer: clean_chat_text(&text),
                source: "llm".to_string(),
                llm_used: true,
                provider,
                model,
                llm_error: None,
            }
        }
        Err(e) => {
            warn!(well = %ctx.well_id, provider = %provider, error = %e, "Chat request failed");
            let error = e.to_string();
            let answer = if error.to_lowercase().contains("insufficient_quota") {
                QUOTA_ANSWER.to_string()
            } else {
                format!("AI chat is unavailable due to a {provider} API error.")
            };
            ChatReply {
                answer,
                source: "fallback".to_string(),
                llm_used: false,
                provider,
                model,
                llm_error: Some(error),
            }
        }
    }
}
