//! OpenAI-compatible chat-completions provider.
//!
//! Groq, OpenAI, and self-hosted servers such as vLLM or Ollama's OpenAI
//! endpoint all accept the same request shape; only the base URL, model and
//! key differ.
//!
//! # Example
//!
//! ```rust,ignore
//! use cvr_model::openai::{ChatClientConfig, OpenAICompatClient};
//!
//! // Groq with the default model
//! let groq = OpenAICompatClient::new(ChatClientConfig::groq(api_key))?;
//!
//! // A local server with a shorter timeout
//! let local = OpenAICompatClient::new(
//!     ChatClientConfig::compatible("unused", "http://localhost:8000/v1", "qwen2.5")
//!         .with_timeout(Duration::from_secs(30)),
//! )?;
//! ```
//!
//! # Supported Providers
//!
//! | Provider | Preset | Default model |
//! |----------|--------|---------------|
//! | Groq | [`ChatClientConfig::groq`] | `llama-3.1-8b-instant` |
//! | OpenAI | [`ChatClientConfig::openai`] | caller's choice |
//! | Other | [`ChatClientConfig::compatible`] | caller's choice |

mod client;
mod config;

pub use client::OpenAICompatClient;
pub use config::{
    ChatClientConfig, DEFAULT_GROQ_MODEL, DEFAULT_TIMEOUT, GROQ_API_BASE, OPENAI_API_BASE,
};
