//! Error types for chat generation.

use std::time::Duration;

use thiserror::Error;

/// Ways a generation call can fail.
///
/// None of these are retried by the client; the caller decides whether to
/// ask the user to resend.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The endpoint did not answer within the configured timeout.
    #[error("Request timed out after {}s", timeout.as_secs_f32())]
    Timeout {
        /// The budget that was exceeded.
        timeout: Duration,
    },

    /// The credential was missing or rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The provider is throttling requests.
    #[error("Rate limited: {message}")]
    RateLimit {
        /// Provider message.
        message: String,
        /// Wait suggested by the `Retry-After` header, when present.
        retry_after: Option<Duration>,
    },

    /// Any other transport, protocol or non-2xx failure.
    #[error("Upstream error: {message}")]
    Upstream {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Provider message or transport error.
        message: String,
    },
}

impl GenerationError {
    pub(crate) fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream { status, message: message.into() }
    }
}

/// A convenience result type for generation calls.
pub type Result<T> = std::result::Result<T, GenerationError>;
