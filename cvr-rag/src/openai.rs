//! Remote embeddings from an OpenAI-compatible `/embeddings` endpoint.
//!
//! This module is only available when the `openai` feature is enabled.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// OpenAI's API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Output width of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
/// Most inputs sent in one request.
pub const MAX_INPUTS_PER_REQUEST: usize = 256;

const PROVIDER: &str = "openai";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for an embeddings endpoint.
///
/// `Debug` output redacts the API key.
#[derive(Clone)]
pub struct EmbeddingClientConfig {
    /// Bearer credential.
    pub api_key: String,
    /// API base URL without the trailing `/embeddings`.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Vector width the model returns.
    pub dimensions: usize,
    /// Ask the server to shorten vectors to `dimensions`.
    pub truncate: bool,
    /// Bound on one request.
    pub timeout: Duration,
}

impl fmt::Debug for EmbeddingClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("truncate", &self.truncate)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EmbeddingClientConfig {
    /// Settings for any compatible server whose model returns `dimensions`-wide vectors.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
            truncate: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// OpenAI with `text-embedding-3-small`.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::compatible(api_key, OPENAI_API_BASE, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_DIMENSIONS)
    }

    /// Have the server shorten vectors to `dimensions` (text-embedding-3 models).
    pub fn truncated_to(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self.truncate = true;
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[derive(Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsReply {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// An [`EmbeddingProvider`] calling an OpenAI-compatible embeddings API.
///
/// Large batches are sent in requests of at most
/// [`MAX_INPUTS_PER_REQUEST`] inputs. Vectors come back in input order
/// whatever order the server lists them in.
///
/// ```rust,ignore
/// use cvr_rag::openai::{EmbeddingClientConfig, OpenAIEmbeddingProvider};
///
/// let provider = OpenAIEmbeddingProvider::new(EmbeddingClientConfig::openai("sk-..."))?;
/// let vector = provider.embed("Jane Doe, Python").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    http: reqwest::Client,
    config: EmbeddingClientConfig,
}

impl fmt::Debug for OpenAIEmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIEmbeddingProvider").field("config", &self.config).finish()
    }
}

impl OpenAIEmbeddingProvider {
    /// Build a provider from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] for a blank API key and
    /// [`RagError::Config`] for zero dimensions or an unusable HTTP client.
    pub fn new(config: EmbeddingClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RagError::embedding(PROVIDER, "API key must not be empty"));
        }
        if config.dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be greater than zero".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// OpenAI defaults with the key from `OPENAI_API_KEY`.
    ///
    /// `OPENAI_BASE_URL`, when set, points the provider at another server.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RagError::embedding(PROVIDER, "OPENAI_API_KEY is not set"))?;
        let mut config = EmbeddingClientConfig::openai(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        Self::new(config)
    }

    /// Settings this provider was built with.
    pub fn config(&self) -> &EmbeddingClientConfig {
        &self.config
    }

    async fn request(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingsBody {
            model: &self.config.model,
            input: inputs,
            dimensions: self.config.truncate.then_some(self.config.dimensions),
        };
        let response = self
            .http
            .post(self.config.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let what = if e.is_timeout() { "request timed out" } else { "request failed" };
                warn!(provider = PROVIDER, error = %e, "{what}");
                RagError::embedding(PROVIDER, format!("{what}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ApiErrorBody>(&raw).map(|b| b.error.message).unwrap_or(raw);
            warn!(provider = PROVIDER, %status, "embeddings request rejected");
            let message = match status.as_u16() {
                401 | 403 => format!("authentication failed ({status}): {detail}"),
                429 => format!("rate limited ({status}): {detail}"),
                _ => format!("server returned {status}: {detail}"),
            };
            return Err(RagError::embedding(PROVIDER, message));
        }

        let mut reply: EmbeddingsReply = response
            .json()
            .await
            .map_err(|e| RagError::embedding(PROVIDER, format!("malformed response: {e}")))?;
        if reply.data.len() != inputs.len() {
            return Err(RagError::embedding(
                PROVIDER,
                format!("sent {} inputs, got {} vectors", inputs.len(), reply.data.len()),
            ));
        }
        reply.data.sort_by_key(|item| item.index);
        Ok(reply.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| RagError::embedding(PROVIDER, "server returned no vector"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(RagError::embedding(PROVIDER, "input text is empty"));
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_INPUTS_PER_REQUEST) {
            debug!(provider = PROVIDER, model = %self.config.model, inputs = batch.len(), "requesting embeddings");
            vectors.extend(self.request(batch).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
