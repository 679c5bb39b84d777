//! Builds the per-question prompt from a persona, retrieved passages and the question.

use cvr_rag::ScoredChunk;

use crate::persona::Persona;

/// Text used in place of excerpts when retrieval returned nothing.
pub const NO_EXCERPTS: &str =
    "(No relevant excerpts were found in the CV. Say that the CV does not cover this.)";

/// Compose the instruction sent as the final user turn.
///
/// The result contains, in order: the persona directive, every retrieved
/// chunk text verbatim in retrieval order, and the literal question.
///
/// ```rust
/// use cvr_rag::{Chunk, ScoredChunk};
/// use cvr_session::{Persona, prompt};
///
/// let hits = vec![ScoredChunk {
///     chunk: Chunk { id: 0, text: "Jane Doe, 5 years Python backend experience".into(), source_offset: 0 },
///     score: 0.9,
/// }];
/// let prompt = prompt::compose(Persona::Formal, "What language does the candidate know?", &hits);
/// assert!(prompt.contains("Jane Doe, 5 years Python backend experience"));
/// ```
pub fn compose(persona: Persona, question: &str, passages: &[ScoredChunk]) -> String {
    let mut out = String::with_capacity(
        persona.directive().len()
            + question.len()
            + passages.iter().map(|p| p.chunk.text.len() + 32).sum::<usize>()
            + 64,
    );

    out.push_str(persona.directive());
    out.push_str("\n\nCV excerpts (most relevant first):\n");
    if passages.is_empty() {
        out.push_str(NO_EXCERPTS);
        out.push('\n');
    } else {
        for (i, passage) in passages.iter().enumerate() {
            out.push_str(&format!("[{}] {}\n", i + 1, passage.chunk.text));
        }
    }
    out.push_str("\nQuestion: ");
    out.push_str(question);
    out
}
