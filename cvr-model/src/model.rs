//! The chat model abstraction used by sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::turn::Turn;

/// A single generation request: the ordered turns plus sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first. The last turn is normally the user's.
    pub turns: Vec<Turn>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a request with no token limit.
    pub fn new(turns: Vec<Turn>, temperature: f32) -> Self {
        Self { turns, temperature, max_tokens: None }
    }

    /// Cap the number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A remote or local model that completes a conversation.
///
/// One call is one round trip. Implementations must not retry internally.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier of the model serving requests.
    fn model_id(&self) -> &str;

    /// Generate the next assistant reply for `request`.
    async fn generate(&self, request: &ChatRequest) -> Result<String>;
}
