//! Per-session lifecycle: upload, index, ask.

use std::fmt;
use std::sync::Arc;

use cvr_model::{ChatModel, ChatRequest, Turn};
use cvr_rag::{Chunk, EmbeddingProvider, RagError, ScoredChunk, VectorIndex, extract_pdf};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::conversation::Conversation;
use crate::error::{Result, SessionError};
use crate::persona::Persona;
use crate::prompt;

/// Progress signal published to anything rendering the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing has been indexed yet.
    NoDocument,
    /// A document is being extracted, chunked and embedded.
    Indexing,
    /// The index is built and questions can be asked.
    Ready {
        /// Number of chunks in the index.
        chunks: usize,
    },
    /// The last upload failed; the session has no document.
    Error(String),
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::NoDocument => f.write_str("no document"),
            SessionStatus::Indexing => f.write_str("indexing..."),
            SessionStatus::Ready { chunks } => write!(f, "ready ({chunks} chunks)"),
            SessionStatus::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// A generated reply together with the passages it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Model output.
    pub reply: String,
    /// Retrieved passages, most relevant first.
    pub sources: Vec<ScoredChunk>,
    /// Persona the reply was generated under.
    pub persona: Persona,
}

#[derive(Debug)]
enum DocumentState {
    NoDocument,
    Indexing,
    Ready(VectorIndex),
}

/// One user's conversation about one uploaded CV.
///
/// The session moves `NoDocument -> Indexing -> Ready`. A failed upload
/// drops back to `NoDocument`; a new upload discards the previous index and
/// starts a fresh conversation. Questions never change the state.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use cvr_model::MockChatModel;
/// use cvr_rag::HashingEmbedder;
/// use cvr_session::{Persona, Session, SessionConfig};
///
/// let mut session = Session::new(
///     SessionConfig::default(),
///     Arc::new(HashingEmbedder::default()),
///     Arc::new(MockChatModel::default()),
/// )?;
/// session.upload(&std::fs::read("cv.pdf")?).await?;
/// session.set_persona(Persona::Savage);
/// let answer = session.ask("What language does the candidate know?").await?;
/// ```
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn ChatModel>,
    persona: Persona,
    conversation: Conversation,
    state: DocumentState,
    status: watch::Sender<SessionStatus>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("persona", &self.persona)
            .field("embedder", &self.embedder.name())
            .field("model", &self.model.model_id())
            .field("state", &self.state)
            .field("turns", &self.conversation.len())
            .finish()
    }
}

impl Session {
    /// Create a session with no document.
    ///
    /// The embedder is shared by every index this session builds and by
    /// every query against it.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(
        config: SessionConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        config.validate()?;
        let persona = config.persona;
        let (status, _) = watch::channel(SessionStatus::NoDocument);
        let id = Uuid::new_v4();
        debug!(session_id = %id, embedder = embedder.name(), model = model.model_id(), "session created");
        Ok(Self {
            id,
            config,
            embedder,
            model,
            persona,
            conversation: Conversation::with_system(persona.system_prompt()),
            state: DocumentState::NoDocument,
            status,
        })
    }

    /// Unique id of this session, used in log spans.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Settings the session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Active persona.
    pub fn persona(&self) -> Persona {
        self.persona
    }

    /// Switch persona. The system turn is rewritten in place; the index is untouched.
    pub fn set_persona(&mut self, persona: Persona) {
        if self.persona != persona {
            info!(session_id = %self.id, from = %self.persona, to = %persona, "persona switched");
        }
        self.persona = persona;
        self.conversation.set_system(persona.system_prompt());
    }

    /// The conversation log.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receive every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// True once a document has been indexed.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, DocumentState::Ready(_))
    }

    /// The index for the current document, if any.
    pub fn index(&self) -> Option<&VectorIndex> {
        match &self.state {
            DocumentState::Ready(index) => Some(index),
            _ => None,
        }
    }

    /// Index a PDF, replacing any previous document.
    ///
    /// Returns the number of chunks indexed. On failure the session has no
    /// document and the conversation is left as it was.
    #[instrument(skip(self, bytes), fields(session_id = %self.id, bytes = bytes.len()))]
    pub async fn upload(&mut self, bytes: &[u8]) -> Result<usize> {
        self.begin_indexing();
        let outcome = match extract_pdf(bytes) {
            Ok(extracted) => {
                debug!(pages = extracted.page_count(), "text extracted");
                self.build_index(&extracted.joined()).await
            }
            Err(e) => Err(e.into()),
        };
        self.finish_indexing(outcome)
    }

    /// Index already-extracted text, replacing any previous document.
    #[instrument(skip(self, text), fields(session_id = %self.id, chars = text.len()))]
    pub async fn upload_text(&mut self, text: &str) -> Result<usize> {
        self.begin_indexing();
        let outcome = self.build_index(text).await;
        self.finish_indexing(outcome)
    }

    /// Answer a question about the indexed document.
    ///
    /// The request sent to the model is the conversation so far followed by
    /// one user turn holding the composed prompt. On success the raw
    /// question and the reply are appended to the conversation; on failure
    /// nothing is appended.
    #[instrument(skip(self, question), fields(session_id = %self.id, persona = %self.persona))]
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        let DocumentState::Ready(index) = &self.state else {
            return Err(SessionError::NoDocument);
        };

        let persona = self.persona;
        self.conversation.set_system(persona.system_prompt());

        let sources = index.retrieve(question, self.config.rag.top_k).await?;
        debug!(
            retrieved = sources.len(),
            top_score = sources.first().map(|s| s.score),
            "passages retrieved"
        );

        let request = self.request_for(persona, question, &sources);
        let reply = match self.model.generate(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "generation failed");
                return Err(e.into());
            }
        };

        self.conversation.push_user(question);
        self.conversation.push_assistant(reply.clone());
        info!(reply_len = reply.len(), sources = sources.len(), "question answered");

        Ok(Answer { reply, sources, persona })
    }

    fn request_for(&self, persona: Persona, question: &str, sources: &[ScoredChunk]) -> ChatRequest {
        let mut turns = Vec::with_capacity(self.conversation.len() + 1);
        turns.extend_from_slice(self.conversation.turns());
        turns.push(Turn::user(prompt::compose(persona, question, sources)));

        let request = ChatRequest::new(turns, self.config.temperatures.for_persona(persona));
        match self.config.generation.max_tokens {
            Some(max) => request.with_max_tokens(max),
            None => request,
        }
    }

    fn begin_indexing(&mut self) {
        self.state = DocumentState::Indexing;
        self.status.send_replace(SessionStatus::Indexing);
    }

    async fn build_index(&self, text: &str) -> Result<VectorIndex> {
        let mut chunks = self.config.rag.chunker()?.split(text);
        let total = chunks.len();
        chunks.retain(Chunk::is_embeddable);
        if chunks.len() < total {
            debug!(skipped = total - chunks.len(), "skipped chunks without words");
        }
        if chunks.is_empty() {
            return Err(RagError::Index("document contains no extractable text".into()).into());
        }
        let index = VectorIndex::build(Arc::clone(&self.embedder), chunks)
            .await?
            .with_similarity_threshold(self.config.rag.similarity_threshold);
        Ok(index)
    }

    fn finish_indexing(&mut self, outcome: Result<VectorIndex>) -> Result<usize> {
        match outcome {
            Ok(index) => {
                let chunks = index.len();
                self.state = DocumentState::Ready(index);
                self.conversation.reset();
                self.status.send_replace(SessionStatus::Ready { chunks });
                info!(chunks, "document indexed");
                Ok(chunks)
            }
            Err(e) => {
                self.state = DocumentState::NoDocument;
                self.status.send_replace(SessionStatus::Error(e.to_string()));
                warn!(error = %e, "indexing failed");
                Err(e)
            }
        }
    }
}
