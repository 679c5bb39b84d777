//! Local neural embeddings via [`fastembed`].
//!
//! This module is only available when the `local-embeddings` feature is
//! enabled. The ONNX model is downloaded into the cache directory on first
//! use and loaded from there afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "fastembed";

/// Model loading options for [`FastEmbedProvider`].
#[derive(Debug, Clone)]
pub struct FastEmbedOptions {
    /// Sentence embedding model. Defaults to all-MiniLM-L6-v2 (384 dimensions).
    pub model: EmbeddingModel,
    /// Where model files are cached. `None` uses fastembed's default.
    pub cache_dir: Option<PathBuf>,
    /// Show a progress bar while the model downloads.
    pub show_download_progress: bool,
}

impl Default for FastEmbedOptions {
    fn default() -> Self {
        Self { model: EmbeddingModel::AllMiniLML6V2, cache_dir: None, show_download_progress: false }
    }
}

/// An [`EmbeddingProvider`] running a sentence-embedding model in process.
///
/// Unlike [`HashingEmbedder`](crate::HashingEmbedder), related wording scores
/// as similar even when no word is shared: "programming language" lands next
/// to "Python backend experience".
///
/// Inference is CPU-bound and runs on the blocking thread pool.
///
/// ```rust,ignore
/// use cvr_rag::{FastEmbedOptions, FastEmbedProvider};
///
/// let embedder = FastEmbedProvider::load(FastEmbedOptions::default()).await?;
/// ```
#[derive(Clone)]
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl FastEmbedProvider {
    /// Load (downloading if needed) the configured model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the model cannot be fetched or
    /// initialised.
    pub async fn load(options: FastEmbedOptions) -> Result<Self> {
        let model_name = format!("{:?}", options.model);
        info!(provider = PROVIDER, model = %model_name, "loading embedding model");

        let model = tokio::task::spawn_blocking(move || {
            let mut init = InitOptions::default();
            init.model_name = options.model;
            init.show_download_progress = options.show_download_progress;
            if let Some(dir) = options.cache_dir {
                init.cache_dir = dir;
            }
            TextEmbedding::try_new(init)
        })
        .await
        .map_err(|e| RagError::embedding(PROVIDER, format!("model loading task failed: {e}")))?
        .map_err(|e| RagError::embedding(PROVIDER, format!("failed to load {model_name}: {e}")))?;
        let model = Arc::new(model);

        // The output width is a property of the model; read it off one vector.
        let sample = run_model(Arc::clone(&model), vec!["dimension check".to_string()]).await?;
        let dimensions = sample.first().map(Vec::len).unwrap_or_default();
        if dimensions == 0 {
            return Err(RagError::embedding(PROVIDER, "model produced an empty vector"));
        }

        info!(provider = PROVIDER, model = %model_name, dimensions, "embedding model ready");
        Ok(Self { model, model_name, dimensions })
    }

    /// Debug name of the loaded model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

async fn run_model(model: Arc<TextEmbedding>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
    tokio::task::spawn_blocking(move || model.embed(texts, None))
        .await
        .map_err(|e| RagError::embedding(PROVIDER, format!("embedding task failed: {e}")))?
        .map_err(|e| RagError::embedding(PROVIDER, e.to_string()))
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "model returned no vector"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(RagError::embedding(PROVIDER, "input text is empty"));
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), "embedding batch");
        let owned = texts.iter().map(|t| t.to_string()).collect();
        let vectors = run_model(Arc::clone(&self.model), owned).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::embedding(
                PROVIDER,
                format!("expected {} vectors, got {}", texts.len(), vectors.len()),
            ));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
