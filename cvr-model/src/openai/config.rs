//! Configuration for OpenAI-compatible chat endpoints.

use std::fmt;
use std::time::Duration;

/// Groq's OpenAI-compatible API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
/// OpenAI's API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Default Groq model.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
/// Default bound on one generation round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for an OpenAI-compatible chat-completions API.
///
/// The API key is held only in memory; `Debug` output redacts it.
#[derive(Clone)]
pub struct ChatClientConfig {
    /// Bearer credential.
    pub api_key: String,
    /// API base URL without the trailing `/chat/completions`.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bound on one request, connection included.
    pub timeout: Duration,
}

impl fmt::Debug for ChatClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ChatClientConfig {
    /// Settings for any compatible server.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Groq with the default `llama-3.1-8b-instant` model.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::compatible(api_key, GROQ_API_BASE, DEFAULT_GROQ_MODEL)
    }

    /// OpenAI with the given model.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::compatible(api_key, OPENAI_API_BASE, model)
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}
