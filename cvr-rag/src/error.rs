//! Error types for the `cvr-rag` crate.

use thiserror::Error;

/// Errors that can occur while turning a PDF into a searchable index.
#[derive(Debug, Error)]
pub enum RagError {
    /// The byte stream is not a readable PDF.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Chunking parameters were rejected.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index could not be built.
    #[error("Index error: {0}")]
    Index(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub(crate) fn embedding(provider: &str, message: impl Into<String>) -> Self {
        Self::Embedding { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
