/// LLM Client — the single point of entry for all Gemini calls in the screener.
///
/// ARCHITECTURAL RULE: No other module may call the generative API directly.
/// All question generation MUST go through `GenerationClient`.
///
/// Model: gemini-1.5-flash (hardcoded — do not make configurable to prevent drift)
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::screening::models::ChatTurn;

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all generation calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-1.5-flash";
/// Number of most recent chat turns forwarded with each request.
const HISTORY_WINDOW: usize = 2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Model seam
// ────────────────────────────────────────────────────────────────────────────

/// One round trip to a text model.
///
/// `Ok(None)` means the service answered but the response carried no usable text.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>, LlmError>;
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate. Blank output counts as none.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` over REST.
#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    api_key: String,
}

impl GeminiModel {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>, LlmError> {
        let url = format!("{GEMINI_API_BASE}/{MODEL}:generateContent");
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        Ok(gemini_response.text())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation client
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of a generation request. Callers must handle both arms; `Unavailable`
/// is a normal branch (fall back), never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    Unavailable,
}

/// Where the conversation stands, rendered into the request preamble.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub stage: String,
    pub technology: String,
    pub difficulty: String,
    pub question_number: usize,
}

/// Retry-bounded wrapper around a `TextModel`.
#[derive(Clone)]
pub struct GenerationClient {
    model: Option<Arc<dyn TextModel>>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl GenerationClient {
    pub fn new(model: Option<Arc<dyn TextModel>>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            model,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Sends `prompt` with the stage preamble and the last two history turns.
    ///
    /// Failed attempts are retried with a fixed delay. Once attempts run out, or the
    /// service returns no text, the result is `Generation::Unavailable`.
    pub async fn generate(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        context: &StageContext,
    ) -> Generation {
        let Some(model) = &self.model else {
            debug!("No generation model configured; skipping request");
            return Generation::Unavailable;
        };

        let full_prompt = build_full_prompt(prompt, history, context);

        for attempt in 1..=self.max_attempts {
            match model.generate_content(&full_prompt).await {
                Ok(Some(text)) => return Generation::Text(text),
                Ok(None) => {
                    warn!("Generation returned no text");
                    return Generation::Unavailable;
                }
                Err(e) => {
                    warn!(
                        "Generation attempt {}/{} failed: {}",
                        attempt, self.max_attempts, e
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Generation::Unavailable
    }
}

/// Layout: preamble, role-prefixed recent turns, then the new prompt.
fn build_full_prompt(prompt: &str, history: &[ChatTurn], context: &StageContext) -> String {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    let messages_text = recent
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n{}\nUser: {}\nAssistant:",
        prompts::render_system_prompt(context),
        messages_text,
        prompt
    )
}
