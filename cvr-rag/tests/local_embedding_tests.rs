//! Tests for the in-process sentence-embedding provider.
#![cfg(feature = "local-embeddings")]

use std::sync::Arc;

use cvr_rag::{Chunk, FastEmbedOptions, FastEmbedProvider, RagError, VectorIndex};

#[tokio::test]
async fn unusable_cache_dir_is_an_embedding_error() {
    // A regular file where the cache directory should be.
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let options =
        FastEmbedOptions { cache_dir: Some(blocker.path().join("models")), ..FastEmbedOptions::default() };

    let err = FastEmbedProvider::load(options).await.unwrap_err();
    match err {
        RagError::Embedding { provider, .. } => assert_eq!(provider, "fastembed"),
        other => panic!("expected an embedding error, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "Requires model download - run manually"]
async fn ranks_by_meaning_without_shared_words() {
    let embedder = Arc::new(FastEmbedProvider::load(FastEmbedOptions::default()).await.unwrap());
    assert_eq!(embedder.model_name(), "AllMiniLML6V2");

    let chunks = vec![
        Chunk { id: 0, text: "Hobbies: hiking, watercolour painting and chess.".into(), source_offset: 0 },
        Chunk { id: 1, text: "Jane Doe, 5 years Python backend experience.".into(), source_offset: 50 },
        Chunk {
            id: 2,
            text: "Education: BA in History, University of Lisbon, 2012.".into(),
            source_offset: 95,
        },
    ];
    let index = VectorIndex::build(embedder, chunks).await.unwrap();
    assert_eq!(index.dimensions(), 384);

    let hits = index.retrieve("What programming language does the candidate know?", 3).await.unwrap();
    assert_eq!(hits[0].chunk.id, 1);
}
