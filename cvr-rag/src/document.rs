//! Data types for extracted text, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// Text pulled out of a PDF, one entry per page in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Page texts in document order. Image-only pages are empty strings.
    pub pages: Vec<String>,
}

impl ExtractedText {
    /// Join the pages with a single newline.
    ///
    /// Page boundaries are not preserved once the text is chunked.
    pub fn joined(&self) -> String {
        self.pages.join("\n")
    }

    /// Number of pages in the source document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// True when no page produced any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|page| page.trim().is_empty())
    }
}

/// A contiguous span of extracted text used as the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in split order, starting at zero.
    pub id: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset of the first character within the source text.
    pub source_offset: usize,
}

impl Chunk {
    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Character range covered by this chunk in the source text.
    pub fn char_range(&self) -> std::ops::Range<usize> {
        self.source_offset..self.source_offset + self.char_len()
    }

    /// True when the chunk holds at least one letter or digit.
    ///
    /// Separator lines and other punctuation-only spans carry nothing to
    /// retrieve and are rejected by the embedders.
    pub fn is_embeddable(&self) -> bool {
        self.text.chars().any(char::is_alphanumeric)
    }
}

/// A retrieved [`Chunk`] paired with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk { id: 0, text: text.to_string(), source_offset: 0 }
    }

    #[test]
    fn punctuation_only_chunks_are_not_embeddable() {
        assert!(!chunk("________").is_embeddable());
        assert!(!chunk(" -- | ** \n").is_embeddable());
        assert!(chunk("__ Rust __").is_embeddable());
        assert!(chunk("2019").is_embeddable());
        assert!(chunk("Ålesund").is_embeddable());
    }
}
