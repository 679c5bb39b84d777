//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::config::ChatClientConfig;
use crate::error::{GenerationError, Result};
use crate::model::{ChatModel, ChatRequest};
use crate::turn::Role;

/// Client for Groq, OpenAI and other servers speaking the OpenAI
/// `/chat/completions` protocol.
///
/// # Example
///
/// ```rust,ignore
/// use cvr_model::{ChatModel, ChatRequest, Turn};
/// use cvr_model::openai::{ChatClientConfig, OpenAICompatClient};
///
/// let client = OpenAICompatClient::new(ChatClientConfig::groq(api_key))?;
/// let reply = client.generate(&ChatRequest::new(vec![Turn::user("Hi")], 0.7)).await?;
/// ```
#[derive(Debug)]
pub struct OpenAICompatClient {
    client: reqwest::Client,
    config: ChatClientConfig,
}

impl OpenAICompatClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Auth`] if the API key is empty, or
    /// [`GenerationError::Upstream`] if the HTTP client cannot be built.
    pub fn new(config: ChatClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Auth("API key must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::upstream(None, format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// The settings this client was created with.
    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            warn!(model = %self.config.model, timeout = ?self.config.timeout, "generation timed out");
            GenerationError::Timeout { timeout: self.config.timeout }
        } else {
            error!(model = %self.config.model, error = %e, "generation request failed");
            GenerationError::upstream(e.status().map(|s| s.as_u16()), format!("request failed: {e}"))
        }
    }
}

// ── wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn parse_retry_after(value: Option<&reqwest::header::HeaderValue>) -> Option<Duration> {
    let seconds: f64 = value?.to_str().ok()?.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}

#[async_trait]
impl ChatModel for OpenAICompatClient {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: &ChatRequest) -> Result<String> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages: request
                .turns
                .iter()
                .map(|t| WireMessage { role: t.role, content: &t.content })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            model = %self.config.model,
            turn_count = request.turns.len(),
            temperature = request.temperature,
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
            let raw = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&raw).map(|e| e.error.message).unwrap_or(raw);

            error!(model = %self.config.model, %status, "chat completion API error");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GenerationError::Auth(format!("API returned {status}: {detail}"))
                }
                StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimit {
                    message: format!("API returned {status}: {detail}"),
                    retry_after,
                },
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                    GenerationError::Timeout { timeout: self.config.timeout }
                }
                _ => GenerationError::upstream(
                    Some(status.as_u16()),
                    format!("API returned {status}: {detail}"),
                ),
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                return self.transport_error(e);
            }
            error!(model = %self.config.model, error = %e, "failed to parse completion");
            GenerationError::upstream(Some(status.as_u16()), format!("failed to parse response: {e}"))
        })?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::upstream(Some(status.as_u16()), "response contained no reply")
            })?;

        debug!(model = %self.config.model, reply_len = reply.len(), "chat completion received");
        Ok(reply)
    }
}
