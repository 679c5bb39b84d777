//! Session lifecycle, persona and prompt composition tests.

use std::sync::Arc;

use async_trait::async_trait;
use cvr_model::{GenerationError, MockChatModel, Role, Turn};
use cvr_rag::{EmbeddingProvider, HashingEmbedder, RagConfig, RagError};
use cvr_session::{Persona, Session, SessionConfig, SessionError, SessionStatus, prompt};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

const JANE: &str = "Jane Doe, 5 years Python backend experience";
const QUESTION: &str = "What language does the candidate know?";

fn session_with(model: Arc<MockChatModel>) -> Session {
    Session::new(SessionConfig::default(), Arc::new(HashingEmbedder::default()), model).unwrap()
}

fn single_page_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Embedder that rejects everything.
struct BrokenEmbedder;

#[async_trait]
impl EmbeddingProvider for BrokenEmbedder {
    async fn embed(&self, _text: &str) -> cvr_rag::Result<Vec<f32>> {
        Err(RagError::Embedding { provider: "broken".into(), message: "offline".into() })
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "broken"
    }
}

fn last_prompt(model: &MockChatModel) -> String {
    model.last_request().unwrap().turns.last().unwrap().content.clone()
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn starts_without_a_document() {
    let session = session_with(Arc::new(MockChatModel::default()));
    assert_eq!(session.status(), SessionStatus::NoDocument);
    assert!(!session.is_ready());
    assert!(session.index().is_none());
}

#[tokio::test]
async fn asking_before_upload_is_rejected() {
    let model = Arc::new(MockChatModel::default());
    let mut session = session_with(model.clone());

    let err = session.ask(QUESTION).await.unwrap_err();
    assert!(matches!(err, SessionError::NoDocument));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let mut session = session_with(Arc::new(MockChatModel::default()));
    session.upload_text(JANE).await.unwrap();

    let err = session.ask("   ").await.unwrap_err();
    assert!(matches!(err, SessionError::EmptyQuestion));
}

#[tokio::test]
async fn successful_upload_publishes_ready() {
    let mut session = session_with(Arc::new(MockChatModel::default()));
    let mut status = session.subscribe();

    let chunks = session.upload_text(JANE).await.unwrap();

    assert_eq!(chunks, 1);
    assert!(session.is_ready());
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), SessionStatus::Ready { chunks: 1 });
}

#[tokio::test]
async fn pdf_upload_indexes_extracted_text() {
    let mut session = session_with(Arc::new(MockChatModel::default()));
    session.upload(&single_page_pdf(JANE)).await.unwrap();

    let index = session.index().unwrap();
    assert_eq!(index.len(), 1);
    assert!(index.chunks().next().unwrap().text.contains("Python backend"));
}

#[tokio::test]
async fn invalid_pdf_returns_to_no_document() {
    let mut session = session_with(Arc::new(MockChatModel::default()));
    session.upload_text(JANE).await.unwrap();

    let err = session.upload(b"definitely not a pdf").await.unwrap_err();

    assert!(matches!(err, SessionError::Rag(RagError::Extraction(_))));
    assert!(!session.is_ready());
    assert!(matches!(session.status(), SessionStatus::Error(_)));
}

#[tokio::test]
async fn blank_document_is_an_index_error() {
    let mut session = session_with(Arc::new(MockChatModel::default()));
    let err = session.upload_text("  \n\n  ").await.unwrap_err();
    assert!(matches!(err, SessionError::Rag(RagError::Index(_))));
    assert!(!session.is_ready());
}

#[tokio::test]
async fn separator_lines_do_not_fail_the_upload() {
    let config = SessionConfig {
        rag: RagConfig::builder().chunk_size(40).chunk_overlap(0).build().unwrap(),
        ..SessionConfig::default()
    };
    let mut session =
        Session::new(config, Arc::new(HashingEmbedder::default()), Arc::new(MockChatModel::default()))
            .unwrap();
    let text = format!("Jane Doe, Python backend engineer here.{}Skills: Rust, Go", "_".repeat(80));

    let chunks = session.upload_text(&text).await.unwrap();

    let index = session.index().unwrap();
    assert_eq!(index.len(), chunks);
    assert!(index.chunks().all(|c| c.is_embeddable()));
    assert!(index.chunks().any(|c| c.text.contains("Skills")));
    // Kept chunks still point at their place in the source text.
    let source: Vec<char> = text.chars().collect();
    for chunk in index.chunks() {
        let span: String = source[chunk.char_range()].iter().collect();
        assert_eq!(span, chunk.text);
    }
    let ids: Vec<usize> = index.chunks().map(|c| c.id).collect();
    assert!(ids.windows(2).any(|pair| pair[1] > pair[0] + 1));
}

#[tokio::test]
async fn punctuation_only_document_is_an_index_error() {
    let mut session = session_with(Arc::new(MockChatModel::default()));
    let err = session.upload_text(&"-".repeat(120)).await.unwrap_err();
    assert!(matches!(err, SessionError::Rag(RagError::Index(_))));
}

#[tokio::test]
async fn embedding_failure_keeps_the_conversation() {
    let model = Arc::new(MockChatModel::new("Python."));
    let mut session = session_with(model.clone());
    session.upload_text(JANE).await.unwrap();
    session.ask(QUESTION).await.unwrap();
    let before = session.conversation().clone();

    let mut broken =
        Session::new(SessionConfig::default(), Arc::new(BrokenEmbedder), model).unwrap();
    let err = broken.upload_text(JANE).await.unwrap_err();
    assert!(matches!(err, SessionError::Rag(RagError::Embedding { .. })));
    assert_eq!(broken.status(), SessionStatus::Error(err.to_string()));

    // A failed re-upload on the first session leaves its turns alone.
    session.upload_text("").await.unwrap_err();
    assert_eq!(session.conversation(), &before);
}

#[tokio::test]
async fn new_upload_starts_a_fresh_conversation() {
    let mut session = session_with(Arc::new(MockChatModel::new("ok")));
    session.upload_text(JANE).await.unwrap();
    session.ask(QUESTION).await.unwrap();
    assert_eq!(session.conversation().visible_turns().len(), 2);

    session.upload_text("John Roe, 10 years Java experience").await.unwrap();
    assert!(session.conversation().visible_turns().is_empty());
    assert_eq!(session.conversation().system(), Some(Persona::Formal.system_prompt()));
}

// ---------------------------------------------------------------------------
// Asking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn answer_carries_reply_sources_and_persona() {
    let mut session = session_with(Arc::new(MockChatModel::new("Python.")));
    session.upload_text(JANE).await.unwrap();

    let answer = session.ask(QUESTION).await.unwrap();

    assert_eq!(answer.reply, "Python.");
    assert_eq!(answer.persona, Persona::Formal);
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].chunk.text, JANE);
}

#[tokio::test]
async fn ask_appends_question_and_reply() {
    let mut session = session_with(Arc::new(MockChatModel::new("Python.")));
    session.upload_text(JANE).await.unwrap();
    session.ask(QUESTION).await.unwrap();

    assert_eq!(
        session.conversation().visible_turns(),
        &[Turn::user(QUESTION), Turn::assistant("Python.")]
    );
}

#[tokio::test]
async fn generation_failure_leaves_conversation_unchanged() {
    let model = Arc::new(
        MockChatModel::new("ok").then_error(GenerationError::Auth("invalid key".into())),
    );
    let mut session = session_with(model);
    session.upload_text(JANE).await.unwrap();
    let before = session.conversation().clone();

    let err = session.ask(QUESTION).await.unwrap_err();

    assert!(matches!(err, SessionError::Generation(GenerationError::Auth(_))));
    assert_eq!(session.conversation(), &before);
    assert!(session.is_ready());
}

#[tokio::test]
async fn request_is_history_plus_composed_prompt() {
    let model = Arc::new(MockChatModel::new("ok"));
    let mut session = session_with(model.clone());
    session.upload_text(JANE).await.unwrap();
    session.ask("First question?").await.unwrap();
    session.ask(QUESTION).await.unwrap();

    let request = model.last_request().unwrap();
    let roles: Vec<Role> = request.turns.iter().map(|t| t.role).collect();
    assert_eq!(roles, [Role::System, Role::User, Role::Assistant, Role::User]);
    assert_eq!(request.turns[1].content, "First question?");
    assert!(request.turns[3].content.contains(JANE));
    assert!(request.turns[3].content.ends_with(QUESTION));
}

#[tokio::test]
async fn top_k_bounds_retrieved_sources() {
    let config = SessionConfig {
        rag: RagConfig::builder().chunk_size(40).chunk_overlap(10).top_k(2).build().unwrap(),
        ..SessionConfig::default()
    };
    let mut session =
        Session::new(config, Arc::new(HashingEmbedder::default()), Arc::new(MockChatModel::default()))
            .unwrap();
    let text = "Jane Doe is a backend engineer. She writes Python every day. \
                She also maintains Kubernetes clusters. She speaks English and Indonesian.";
    assert!(session.upload_text(text).await.unwrap() > 2);

    let answer = session.ask("Which programming language?").await.unwrap();
    assert_eq!(answer.sources.len(), 2);
}

// ---------------------------------------------------------------------------
// Personas
// ---------------------------------------------------------------------------

#[tokio::test]
async fn system_turn_stays_single_and_first() {
    let mut session = session_with(Arc::new(MockChatModel::new("ok")));
    session.upload_text(JANE).await.unwrap();

    for (i, persona) in [Persona::Savage, Persona::Formal, Persona::Savage].into_iter().enumerate() {
        session.set_persona(persona);
        session.ask(&format!("question {i}")).await.unwrap();
    }

    let turns = session.conversation().turns();
    assert_eq!(turns.iter().filter(|t| t.role == Role::System).count(), 1);
    assert_eq!(turns[0].role, Role::System);
    assert_eq!(turns[0].content, Persona::Savage.system_prompt());
    assert_eq!(turns.len(), 7);
}

#[tokio::test]
async fn persona_sets_temperature_per_request() {
    let model = Arc::new(MockChatModel::new("ok"));
    let mut session = session_with(model.clone());
    session.upload_text(JANE).await.unwrap();

    session.ask(QUESTION).await.unwrap();
    session.set_persona(Persona::Savage);
    let answer = session.ask(QUESTION).await.unwrap();

    let requests = model.requests();
    assert!((requests[0].temperature - 0.7).abs() < f32::EPSILON);
    assert!((requests[1].temperature - 0.8).abs() < f32::EPSILON);
    assert_eq!(answer.persona, Persona::Savage);
    assert_eq!(requests[1].turns[0].content, Persona::Savage.system_prompt());
}

#[tokio::test]
async fn jane_doe_end_to_end_under_both_personas() {
    let model = Arc::new(MockChatModel::new("Python."));
    let mut session = session_with(model.clone());
    assert_eq!(session.upload_text(JANE).await.unwrap(), 1);

    session.ask(QUESTION).await.unwrap();
    let formal = last_prompt(&model);

    session.set_persona(Persona::Savage);
    session.ask(QUESTION).await.unwrap();
    let savage = last_prompt(&model);

    for prompt in [&formal, &savage] {
        assert!(prompt.contains(JANE));
        assert!(prompt.contains(QUESTION));
    }
    assert!(formal.starts_with(Persona::Formal.directive()));
    assert!(savage.starts_with(Persona::Savage.directive()));
    assert_ne!(formal, savage);
}

#[tokio::test]
async fn personas_share_the_same_facts() {
    let mut session = session_with(Arc::new(MockChatModel::default()));
    session.upload_text(JANE).await.unwrap();
    let sources = session.index().unwrap().retrieve(QUESTION, 4).await.unwrap();

    let formal = prompt::compose(Persona::Formal, QUESTION, &sources);
    let savage = prompt::compose(Persona::Savage, QUESTION, &sources);

    let strip = |p: &str, persona: Persona| p[persona.directive().len()..].to_string();
    assert_eq!(strip(&formal, Persona::Formal), strip(&savage, Persona::Savage));
}
