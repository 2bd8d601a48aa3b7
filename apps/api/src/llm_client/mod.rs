/// LLM Client: the single point of entry for all oracle calls in the triage service.
///
/// ARCHITECTURAL RULE: No other module may call the completions API directly.
/// Everything goes through the `Oracle` trait, which `LlmClient` implements.
///
/// One request per call. Failed calls are NOT retried; callers skip the unit.
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;
#[cfg(test)]
pub mod stub;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Which of the oracle's call shapes a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Sentiment,
    Categories,
    Themes,
    ActionPlan,
}

/// A single completion request. Labeling calls use a near-zero temperature,
/// plan drafting a slightly creative one.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub kind: RequestKind,
    pub system: &'static str,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// What the call is about (review id, theme title, ...). Logged with the call.
    pub subject: String,
}

/// The external text-classification / generation capability.
///
/// Carried in `AppState` as `Arc<dyn Oracle>` so tests can swap in a stub.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, request: &OracleRequest) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }

    /// Trimmed answer text; a missing or blank answer is `EmptyContent`.
    pub fn answer(&self) -> Result<String, LlmError> {
        let text = self.text().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client. The clustering call uses its own (larger context) model.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    cluster_model: String,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        cluster_model: String,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            cluster_model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_for(&self, kind: RequestKind) -> &str {
        match kind {
            RequestKind::Themes => &self.cluster_model,
            _ => &self.model,
        }
    }

    /// Makes a raw call to the completions API, returning the full response object.
    pub async fn call(&self, request: &OracleRequest) -> Result<ChatResponse, LlmError> {
        let body = ChatRequest {
            model: self.model_for(request.kind),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "Oracle call ({:?}, {}) succeeded: prompt_tokens={}, completion_tokens={}",
                request.kind,
                request.subject,
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(chat)
    }
}

#[async_trait]
impl Oracle for LlmClient {
    async fn complete(&self, request: &OracleRequest) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        response.answer()
    }
}

/// Convenience wrapper: completes a request and deserializes the text as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn complete_json<T: DeserializeOwned>(
    oracle: &dyn Oracle,
    request: &OracleRequest,
) -> Result<T, LlmError> {
    let text = oracle.complete(request).await?;
    parse_json(&text)
}

/// Parses oracle output as JSON, tolerating markdown code fences.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
