//! # cvr-cli
//!
//! Terminal front end for the CV reviewer.
//!
//! ```text
//! cvr chat cv.pdf                      interactive chat
//! cvr ask cv.pdf "Any Python?"         one question, then exit
//! cvr chunks cv.pdf                    inspect chunking
//! ```
//!
//! The API key comes from `--api-key` or `GROQ_API_KEY` and is only held
//! in memory. `--offline` answers with a canned reply and embeds with the
//! hashing embedder so the pipeline can be tried without a key or a network.
//! Otherwise chunks are embedded with a local sentence model, downloaded on
//! first use.

pub mod cli;
pub mod config;
pub mod repl;
pub mod telemetry;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cvr_model::{ChatModel, MockChatModel, OpenAICompatClient};
use cvr_rag::{EmbeddingProvider, HashingEmbedder, ScoredChunk, extract_file};
use cvr_session::{Answer, Session, SessionConfig, SessionStatus};
use tokio::sync::watch;
use tracing::{info, warn};

pub use cli::{Cli, Command, EmbedderKind};

/// Reply used by `--offline`.
pub const OFFLINE_REPLY: &str =
    "(offline mode) No model was called. The passages below are what would have been sent.";

/// Width of chunk previews printed by `cvr chunks`.
const PREVIEW_CHARS: usize = 72;

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = config::resolve(&cli)?;

    match &cli.command {
        Command::Chunks { pdf } => print_chunks(&config, pdf),
        Command::Ask { pdf, question } => {
            let mut session = build_session(&cli, config).await?;
            upload_file(&mut session, pdf).await?;
            let answer = session.ask(question).await?;
            print_answer(&answer);
            print_sources(&answer.sources);
            Ok(())
        }
        Command::Chat { pdf } => {
            let mut session = build_session(&cli, config).await?;
            let _status = tokio::spawn(render_status(session.subscribe()));
            repl::run(&mut session, pdf.clone()).await
        }
    }
}

/// Pick the chat model for this run.
pub fn build_model(cli: &Cli, config: &SessionConfig) -> Result<Arc<dyn ChatModel>> {
    if cli.offline {
        info!("offline mode, generation is mocked");
        return Ok(Arc::new(MockChatModel::new(OFFLINE_REPLY)));
    }
    let api_key = cli
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .context("no API key: pass --api-key, set GROQ_API_KEY, or use --offline")?;
    let client = OpenAICompatClient::new(config.generation.client_config(api_key))?;
    Ok(Arc::new(client))
}

/// Pick the embedder for this run.
///
/// When the local model was not asked for explicitly and fails to load, the
/// hashing embedder takes over with a warning.
pub async fn build_embedder(cli: &Cli) -> Result<Arc<dyn EmbeddingProvider>> {
    match cli.embedder_kind() {
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::default())),
        EmbedderKind::Openai => openai_embedder(),
        EmbedderKind::Local => match local_embedder(cli).await {
            Ok(embedder) => Ok(embedder),
            Err(e) if cli.embedder.is_none() => {
                warn!(error = %format!("{e:#}"), "local embedding model unavailable, using hashing embedder");
                Ok(Arc::new(HashingEmbedder::default()))
            }
            Err(e) => Err(e),
        },
    }
}

#[cfg(feature = "local-embeddings")]
async fn local_embedder(cli: &Cli) -> Result<Arc<dyn EmbeddingProvider>> {
    let options = cvr_rag::FastEmbedOptions {
        cache_dir: cli.embedding_cache.clone(),
        ..cvr_rag::FastEmbedOptions::default()
    };
    let provider = cvr_rag::FastEmbedProvider::load(options)
        .await
        .context("failed to load the local embedding model")?;
    info!(embedder = provider.name(), model = provider.model_name(), "using local embeddings");
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "local-embeddings"))]
async fn local_embedder(_cli: &Cli) -> Result<Arc<dyn EmbeddingProvider>> {
    anyhow::bail!("--embedder local needs cvr built with the `local-embeddings` feature")
}

#[cfg(feature = "openai-embeddings")]
fn openai_embedder() -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = cvr_rag::openai::OpenAIEmbeddingProvider::from_env()?;
    info!(embedder = provider.name(), "using remote embeddings");
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "openai-embeddings"))]
fn openai_embedder() -> Result<Arc<dyn EmbeddingProvider>> {
    anyhow::bail!("--embedder openai needs cvr built with the `openai-embeddings` feature")
}

async fn build_session(cli: &Cli, config: SessionConfig) -> Result<Session> {
    let model = build_model(cli, &config)?;
    Ok(Session::new(config, build_embedder(cli).await?, model)?)
}

/// Read and index a PDF from disk.
pub async fn upload_file(session: &mut Session, path: &Path) -> Result<usize> {
    let bytes =
        tokio::fs::read(path).await.with_context(|| format!("failed to read {}", path.display()))?;
    let chunks = session
        .upload(&bytes)
        .await
        .with_context(|| format!("failed to index {}", path.display()))?;
    println!("Indexed {} ({chunks} chunks).", path.display());
    Ok(chunks)
}

/// Print status changes until the session is dropped.
async fn render_status(mut status: watch::Receiver<SessionStatus>) {
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        if current == SessionStatus::Indexing {
            eprintln!("[{current}]");
        }
    }
}

pub(crate) fn print_answer(answer: &Answer) {
    println!("\n{} {}\n", answer.persona.icon(), answer.reply);
}

pub(crate) fn print_sources(sources: &[ScoredChunk]) {
    if sources.is_empty() {
        println!("No passages were retrieved.");
        return;
    }
    println!("Sources:");
    for (rank, hit) in sources.iter().enumerate() {
        println!(
            "  [{}] chunk {} @ char {} (score {:.3}): {}",
            rank + 1,
            hit.chunk.id,
            hit.chunk.source_offset,
            hit.score,
            preview(&hit.chunk.text)
        );
    }
}

fn print_chunks(config: &SessionConfig, pdf: &Path) -> Result<()> {
    let extracted = extract_file(pdf).with_context(|| format!("failed to read {}", pdf.display()))?;
    let text = extracted.joined();
    let chunks = config.rag.chunker()?.split(&text);
    println!(
        "{}: {} pages, {} chars, {} chunks (size {}, overlap {}, {:?})",
        pdf.display(),
        extracted.page_count(),
        text.chars().count(),
        chunks.len(),
        config.rag.chunk_size,
        config.rag.chunk_overlap,
        config.rag.chunk_strategy,
    );
    for chunk in &chunks {
        println!(
            "  #{:<3} @{:<6} {:>4} chars  {}",
            chunk.id,
            chunk.source_offset,
            chunk.char_len(),
            preview(&chunk.text)
        );
    }
    Ok(())
}

/// First [`PREVIEW_CHARS`] characters on one line.
pub fn preview(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    }
}
