//! # cvr-model
//!
//! Chat-completion clients for the CV reviewer.
//!
//! ## Overview
//!
//! - [`ChatModel`] - the trait sessions talk to
//! - [`OpenAICompatClient`] - Groq, OpenAI and compatible servers over HTTP
//! - [`MockChatModel`] - scripted replies for tests and offline use
//!
//! Every call is a single round trip bounded by a timeout. Failures are
//! classified into [`GenerationError`] and returned, never retried.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cvr_model::{ChatModel, ChatRequest, Turn};
//! use cvr_model::openai::{ChatClientConfig, OpenAICompatClient};
//!
//! let client = OpenAICompatClient::new(ChatClientConfig::groq(std::env::var("GROQ_API_KEY")?))?;
//! let reply = client
//!     .generate(&ChatRequest::new(
//!         vec![Turn::system("You review CVs."), Turn::user("Is this CV any good?")],
//!         0.7,
//!     ))
//!     .await?;
//! ```

pub mod error;
pub mod mock;
pub mod model;
pub mod openai;
pub mod turn;

pub use error::{GenerationError, Result};
pub use mock::MockChatModel;
pub use model::{ChatModel, ChatRequest};
pub use openai::{ChatClientConfig, OpenAICompatClient};
pub use turn::{Role, Turn};
