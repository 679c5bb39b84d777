//! Ordered log of conversation turns.

use cvr_model::{Role, Turn};

/// Turns exchanged in one session.
///
/// Append-only, except for the system turn: there is at most one, it always
/// sits at position 0, and [`set_system`](Self::set_system) replaces its
/// content in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// An empty conversation with no system turn.
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation that starts with the given system prompt.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self { turns: vec![Turn::system(prompt)] }
    }

    /// Set the system prompt, replacing the existing one or inserting it at position 0.
    pub fn set_system(&mut self, prompt: impl Into<String>) {
        match self.turns.first_mut() {
            Some(turn) if turn.role == Role::System => turn.content = prompt.into(),
            _ => self.turns.insert(0, Turn::system(prompt)),
        }
    }

    /// The current system prompt, if any.
    pub fn system(&self) -> Option<&str> {
        self.turns.first().filter(|t| t.role == Role::System).map(|t| t.content.as_str())
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// Every turn, system turn included.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The turns a UI should render: everything but the system turn.
    pub fn visible_turns(&self) -> &[Turn] {
        match self.turns.first() {
            Some(turn) if turn.role == Role::System => &self.turns[1..],
            _ => &self.turns,
        }
    }

    /// Number of turns, system turn included.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when there are no turns at all.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop every turn except the system turn.
    pub fn reset(&mut self) {
        let keep = usize::from(self.system().is_some());
        self.turns.truncate(keep);
    }
}
