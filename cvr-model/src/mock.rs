//! A scripted chat model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{GenerationError, Result};
use crate::model::{ChatModel, ChatRequest};

/// A [`ChatModel`] that replays scripted outcomes and records every request.
///
/// Queued replies and errors are returned in order; once the queue is empty
/// every call returns the fallback reply.
///
/// # Example
///
/// ```rust
/// use cvr_model::{GenerationError, MockChatModel};
///
/// let model = MockChatModel::new("Looks solid.")
///     .then_error(GenerationError::Auth("bad key".into()));
/// ```
#[derive(Debug)]
pub struct MockChatModel {
    fallback: String,
    script: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new("mock reply")
    }
}

impl MockChatModel {
    /// Create a mock that always answers `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply.
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.lock_script().push_back(Ok(reply.into()));
        self
    }

    /// Queue an error.
    pub fn then_error(self, error: GenerationError) -> Self {
        self.lock_script().push_back(Err(error));
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).last().cloned()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String>>> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model_id(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ChatRequest) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        self.lock_script().pop_front().unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::Turn;

    #[tokio::test]
    async fn replays_script_then_falls_back() {
        let model = MockChatModel::new("fallback")
            .then_reply("first")
            .then_error(GenerationError::Auth("nope".into()));
        let request = ChatRequest::new(vec![Turn::user("q")], 0.7);

        assert_eq!(model.generate(&request).await.unwrap(), "first");
        assert!(matches!(model.generate(&request).await, Err(GenerationError::Auth(_))));
        assert_eq!(model.generate(&request).await.unwrap(), "fallback");
        assert_eq!(model.requests().len(), 3);
    }
}
