//! In-memory vector index using cosine similarity.
//!
//! [`VectorIndex`] is built once from the chunks of one document and is
//! immutable afterwards. It owns the chunks, their embeddings, and the
//! embedding provider used to produce them, so questions are always embedded
//! by the same model as the chunks they are compared against.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{Chunk, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// A chunk stored together with its embedding.
#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// An immutable in-memory vector index over the chunks of one document.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use cvr_rag::{HashingEmbedder, VectorIndex, chunking};
///
/// let chunks = chunking::split(&text, 1000, 200)?;
/// let index = VectorIndex::build(Arc::new(HashingEmbedder::default()), chunks).await?;
/// let hits = index.retrieve("What language does the candidate know?", 4).await?;
/// ```
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: Vec<IndexedChunk>,
    similarity_threshold: Option<f32>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("embedder", &self.embedder.name())
            .field("chunks", &self.entries.len())
            .field("similarity_threshold", &self.similarity_threshold)
            .finish()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex {
    /// An index with no chunks. Every retrieval returns an empty result.
    pub fn empty(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, entries: Vec::new(), similarity_threshold: None }
    }

    /// Embed every chunk with `embedder` and store it.
    ///
    /// Chunks are kept in id order regardless of input order.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`RagError::Embedding`] if any chunk fails to
    /// embed, or [`RagError::Index`] if the provider returns the wrong number
    /// of vectors or a vector of the wrong dimension, or if chunk ids repeat.
    pub async fn build(embedder: Arc<dyn EmbeddingProvider>, chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            info!(chunk_count = 0, "built empty vector index");
            return Ok(Self::empty(embedder));
        }

        let mut chunks = chunks;
        chunks.sort_by_key(|c| c.id);
        if chunks.windows(2).any(|pair| pair[0].id == pair[1].id) {
            return Err(RagError::Index("chunk ids must be unique".to_string()));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await.inspect_err(|e| {
            error!(provider = embedder.name(), error = %e, "embedding failed during index build");
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Index(format!(
                "provider '{}' returned {} embeddings for {} chunks",
                embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embedder.dimensions();
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(RagError::Index(format!(
                "embedding for chunk {} has {} dimensions, expected {dimensions}",
                chunks[bad].id,
                embeddings[bad].len()
            )));
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        info!(provider = embedder.name(), chunk_count = entries.len(), "built vector index");
        Ok(Self { embedder, entries, similarity_threshold: None })
    }

    /// Drop results scoring below `threshold` during retrieval.
    pub fn with_similarity_threshold(mut self, threshold: Option<f32>) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chunks in id order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Dimensionality of the stored embeddings.
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Name of the provider the index was built with.
    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Return up to `k` chunks most similar to `query`, best first.
    ///
    /// The query is embedded with the same provider that built the index.
    /// Equal scores are ordered by lower chunk id. An empty index returns an
    /// empty result without embedding the query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the query cannot be embedded.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await.inspect_err(|e| {
            error!(provider = self.embedder.name(), error = %e, "query embedding failed");
        })?;

        self.retrieve_with_embedding(&query_embedding, k)
    }

    /// Rank the index against a precomputed query vector.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Index`] if the vector's dimension does not match
    /// the index.
    pub fn retrieve_with_embedding(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimensions() {
            return Err(RagError::Index(format!(
                "query embedding has {} dimensions, index has {}",
                embedding.len(),
                self.dimensions()
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .filter(|hit| self.similarity_threshold.is_none_or(|t| hit.score >= t))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(k);

        debug!(k, result_count = scored.len(), "retrieved chunks");
        Ok(scored)
    }
}
