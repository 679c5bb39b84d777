//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use cvr_rag::ChunkStrategy;
use cvr_session::Persona;

/// Chat with an HR reviewer about a PDF resume.
#[derive(Parser, Debug, Clone)]
#[command(name = "cvr", version, about = "Chat with an HR reviewer about a PDF resume")]
pub struct Cli {
    /// TOML settings file
    #[arg(long, global = true, value_name = "FILE", env = "CVR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Groq (or compatible) API key. Never written to disk.
    #[arg(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Reviewer persona: formal or savage
    #[arg(long, global = true, value_name = "PERSONA")]
    pub persona: Option<Persona>,

    /// Model identifier
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Generation timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Passages retrieved per question
    #[arg(long, global = true, value_name = "K")]
    pub top_k: Option<usize>,

    /// Chunk size in characters
    #[arg(long, global = true, value_name = "CHARS")]
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in characters
    #[arg(long, global = true, value_name = "CHARS")]
    pub chunk_overlap: Option<usize>,

    /// Chunking strategy: fixed or boundary
    #[arg(long, global = true, value_name = "STRATEGY", value_parser = parse_strategy)]
    pub chunk_strategy: Option<ChunkStrategy>,

    /// Embedder: local (sentence model), hashing (no model) or openai (OPENAI_API_KEY)
    #[arg(long, global = true, value_enum, value_name = "KIND")]
    pub embedder: Option<EmbedderKind>,

    /// Directory for downloaded embedding models
    #[arg(long, global = true, value_name = "DIR", env = "CVR_EMBEDDING_CACHE")]
    pub embedding_cache: Option<PathBuf>,

    /// Answer with a canned reply instead of calling the API
    #[arg(long, global = true)]
    pub offline: bool,

    /// More log output (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The embedder to use when `--embedder` is not given.
    ///
    /// `--offline` stays off the network entirely, so it picks hashing.
    pub fn embedder_kind(&self) -> EmbedderKind {
        match self.embedder {
            Some(kind) => kind,
            None if self.offline => EmbedderKind::Hashing,
            None => EmbedderKind::default(),
        }
    }
}

/// Where chunk and question vectors come from.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 run in process
    Local,
    /// Feature hashing, no model files
    Hashing,
    /// OpenAI embeddings endpoint
    Openai,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        if cfg!(feature = "local-embeddings") { Self::Local } else { Self::Hashing }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat about a CV
    Chat {
        /// PDF to load at start; use /upload otherwise
        pdf: Option<PathBuf>,
    },

    /// Ask a single question and exit
    Ask {
        /// PDF resume
        pdf: PathBuf,
        /// Question about the resume
        question: String,
    },

    /// Print how a PDF is chunked
    Chunks {
        /// PDF resume
        pdf: PathBuf,
    },
}

fn parse_strategy(value: &str) -> Result<ChunkStrategy, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fixed" => Ok(ChunkStrategy::Fixed),
        "boundary" => Ok(ChunkStrategy::Boundary),
        other => Err(format!("unknown chunk strategy '{other}', expected 'fixed' or 'boundary'")),
    }
}
