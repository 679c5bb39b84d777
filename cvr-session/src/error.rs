//! Error types for the `cvr-session` crate.

use cvr_model::GenerationError;
use cvr_rag::RagError;
use thiserror::Error;

/// Errors surfaced by a [`Session`](crate::Session).
///
/// Every variant ends the current action only. The conversation log and any
/// index already built are left as they were.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Extraction, chunking, embedding or indexing failed.
    #[error(transparent)]
    Rag(#[from] RagError),

    /// The chat model call failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A question was asked before any document was indexed.
    #[error("No document has been uploaded yet")]
    NoDocument,

    /// The question was empty or whitespace.
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// Session settings were rejected.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
