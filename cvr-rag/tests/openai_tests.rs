//! Remote embedding provider against a local server.
#![cfg(feature = "openai")]

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use cvr_rag::openai::{EmbeddingClientConfig, MAX_INPUTS_PER_REQUEST, OpenAIEmbeddingProvider};
use cvr_rag::{EmbeddingProvider, RagError};
use serde_json::{Value, json};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn provider(base_url: &str) -> OpenAIEmbeddingProvider {
    OpenAIEmbeddingProvider::new(EmbeddingClientConfig::compatible("sk-test", base_url, "tiny", 1))
        .unwrap()
}

/// Answers each input `"n"` with the vector `[n]`, listed in reverse order.
async fn numbering(State(batches): State<Arc<Mutex<Vec<usize>>>>, Json(body): Json<Value>) -> Json<Value> {
    let inputs = body["input"].as_array().unwrap();
    batches.lock().unwrap().push(inputs.len());
    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(i, text)| {
            let n: f32 = text.as_str().unwrap().parse().unwrap();
            json!({ "index": i, "embedding": [n] })
        })
        .collect();
    Json(json!({ "data": data }))
}

#[tokio::test]
async fn large_batches_are_split_and_kept_in_order() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new().route("/v1/embeddings", post(numbering)).with_state(batches.clone());
    let base = spawn(router).await;

    let texts: Vec<String> = (0..MAX_INPUTS_PER_REQUEST + 44).map(|n| n.to_string()).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = provider(&base).embed_batch(&refs).await.unwrap();

    assert_eq!(*batches.lock().unwrap(), vec![MAX_INPUTS_PER_REQUEST, 44]);
    assert_eq!(vectors.len(), texts.len());
    for (n, vector) in vectors.iter().enumerate() {
        assert_eq!(vector, &vec![n as f32]);
    }
}

#[tokio::test]
async fn rejected_key_is_reported_as_authentication_failure() {
    let router = Router::new().route(
        "/v1/embeddings",
        post(|| async {
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": { "message": "Incorrect API key" } })))
        }),
    );
    let base = spawn(router).await;

    let err = provider(&base).embed("Jane Doe").await.unwrap_err();
    match err {
        RagError::Embedding { provider, message } => {
            assert_eq!(provider, "openai");
            assert!(message.contains("authentication failed"));
            assert!(message.contains("Incorrect API key"));
        }
        other => panic!("expected an embedding error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_vectors_are_an_error() {
    let router =
        Router::new().route("/v1/embeddings", post(|| async { Json(json!({ "data": [] })) }));
    let base = spawn(router).await;

    let err = provider(&base).embed_batch(&["a", "b"]).await.unwrap_err();
    assert!(err.to_string().contains("got 0 vectors"));
}

#[tokio::test]
async fn blank_input_fails_before_any_request() {
    let err = provider("http://127.0.0.1:9/v1").embed("  ").await.unwrap_err();
    assert!(err.to_string().contains("empty"));
}
