//! Embedding providers for turning text into vectors.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Vectors from different providers (or differently configured instances of
/// one provider) are not comparable, so a single instance must embed both the
/// chunks of an index and the questions asked against it. The
/// [`VectorIndex`](crate::VectorIndex) enforces this by holding the provider
/// it was built with.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) implementation
/// calls [`embed`](EmbeddingProvider::embed) sequentially; backends that
/// support native batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    ///
    /// Implementations must reject empty input with
    /// [`RagError::Embedding`] rather than return a zero vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name used in logs and errors.
    fn name(&self) -> &str;
}

/// Default dimensionality of [`HashingEmbedder`] vectors.
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

/// A local, deterministic embedder based on feature hashing.
///
/// Text is lower-cased and split into alphanumeric words. Each word, each
/// adjacent word pair and each character trigram of each word is hashed with
/// SHA-256 into one of `dimensions` buckets with a hash-derived sign. The
/// resulting vector is L2-normalised so cosine similarity reduces to a dot
/// product. No model files or network access are needed, and the same input
/// always yields the same vector.
///
/// Similarity is lexical: "Python" in a question matches "Python" in a
/// chunk, but synonyms do not match each other. Prefer `FastEmbedProvider`
/// (feature `local-embeddings`) when a model can be loaded.
///
/// # Example
///
/// ```rust
/// use cvr_rag::{EmbeddingProvider, HashingEmbedder};
///
/// let embedder = HashingEmbedder::new(64).unwrap();
/// assert_eq!(embedder.dimensions(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: DEFAULT_HASHING_DIMENSIONS }
    }
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of the given dimension.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be greater than zero".into()));
        }
        Ok(Self { dimensions })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> =
            lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

        let mut vector = vec![0.0f32; self.dimensions];
        for word in &words {
            self.add_feature(&mut vector, &format!("w:{word}"), 1.0);

            let padded: Vec<char> = format!("#{word}#").chars().collect();
            for trigram in padded.windows(3) {
                let trigram: String = trigram.iter().collect();
                self.add_feature(&mut vector, &format!("c:{trigram}"), 0.5);
            }
        }
        for pair in words.windows(2) {
            self.add_feature(&mut vector, &format!("b:{} {}", pair[0], pair[1]), 0.5);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RagError::embedding(self.name(), "input text is empty"));
        }

        let vector = self.vectorize(text);
        if vector.iter().all(|x| *x == 0.0) {
            // Punctuation-only input has no features to hash.
            return Err(RagError::embedding(self.name(), "input text has no embeddable tokens"));
        }

        debug!(provider = self.name(), text_len = text.len(), "embedded text");
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
