//! # cvr-session
//!
//! One reviewer conversation about one uploaded CV.
//!
//! A [`Session`] ties the retrieval pipeline from `cvr-rag` to a chat model
//! from `cvr-model`:
//!
//! 1. [`Session::upload`] extracts, chunks and embeds the PDF into a fresh index.
//! 2. [`Session::ask`] retrieves the most relevant chunks, composes a prompt for
//!    the active [`Persona`] and sends it with the conversation so far.
//! 3. The question and reply are appended to the [`Conversation`].
//!
//! Status changes are published on a `tokio::sync::watch` channel
//! ([`Session::subscribe`]) so a front end can show progress.

pub mod config;
pub mod conversation;
pub mod error;
pub mod persona;
pub mod prompt;
pub mod session;

pub use config::{GenerationSettings, PersonaTemperatures, SessionConfig};
pub use conversation::Conversation;
pub use error::{Result, SessionError};
pub use persona::{ParsePersonaError, Persona, PersonaTemplate};
pub use session::{Answer, Session, SessionStatus};
