//! # cvr-rag
//!
//! Turns an uploaded PDF resume into a searchable, in-memory index:
//!
//! ```text
//! PDF bytes ─► extract ─► chunking ─► embedding ─► VectorIndex ─► retrieve(question, k)
//! ```
//!
//! - [`extract_pdf`] pulls page-ordered text out of a PDF byte stream.
//! - [`Chunker`] implementations split text into overlapping chunks.
//! - [`EmbeddingProvider`] maps text to vectors. `FastEmbedProvider`
//!   (feature `local-embeddings`) runs a sentence-embedding model locally,
//!   [`HashingEmbedder`] needs no model at all, and
//!   `openai::OpenAIEmbeddingProvider` (feature `openai`) calls a remote
//!   endpoint.
//! - [`VectorIndex`] stores chunk vectors and ranks them by cosine similarity.
//!
//! The index is built once per document and never mutated; uploading a new
//! document means building a new index.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
#[cfg(feature = "local-embeddings")]
pub mod local;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{BoundaryChunker, Chunker, FixedSizeChunker};
pub use config::{ChunkStrategy, RagConfig, RagConfigBuilder};
pub use document::{Chunk, ExtractedText, ScoredChunk};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{RagError, Result};
pub use extract::{extract_file, extract_pdf};
pub use index::VectorIndex;
#[cfg(feature = "local-embeddings")]
pub use local::{FastEmbedOptions, FastEmbedProvider};
