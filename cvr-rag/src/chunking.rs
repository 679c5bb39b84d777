//! Splitting extracted text into overlapping chunks.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] - cuts every `chunk_size` characters
//! - [`BoundaryChunker`] - ends chunks on paragraph, sentence or word boundaries when it can
//!
//! Both count in characters rather than bytes, and both guarantee that every
//! character lands in at least one chunk and that neighbouring chunks share
//! exactly `chunk_overlap` characters.

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting text into chunks.
pub trait Chunker: Send + Sync {
    /// Split text into chunks, numbered from zero in text order.
    ///
    /// Returns an empty `Vec` if the text is empty.
    fn split(&self, text: &str) -> Vec<Chunk>;
}

/// Split `text` into fixed-width chunks.
///
/// # Errors
///
/// Returns [`RagError::Chunking`] if `chunk_size` is zero or
/// `overlap >= chunk_size`.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(FixedSizeChunker::new(chunk_size, overlap)?.split(text))
}

fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::Chunking("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::Chunking(format!(
            "overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Byte offset of every character start, plus the text length as a sentinel.
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect()
}

fn make_chunk(text: &str, bounds: &[usize], id: usize, start: usize, end: usize) -> Chunk {
    Chunk { id, text: text[bounds[start]..bounds[end]].to_string(), source_offset: start }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// # Example
///
/// ```rust
/// use cvr_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(10, 3).unwrap();
/// let chunks = chunker.split("abcdefghijklmnop");
/// assert_eq!(chunks[0].text, "abcdefghij");
/// assert_eq!(chunks[1].text, "hijklmnop");
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Chunking`] on a zero size or an overlap that is
    /// not smaller than the size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let bounds = char_boundaries(text);
        let total = bounds.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total);
            chunks.push(make_chunk(text, &bounds, chunks.len(), start, end));
            if end == total {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Splits text preferring natural boundaries: paragraphs, then sentences, then words.
///
/// Each chunk ends at the latest boundary found in the second half of its
/// window, falling back to a hard cut at `chunk_size` when none exists. The
/// next chunk starts exactly `chunk_overlap` characters before that end, so
/// the coverage and overlap guarantees of [`FixedSizeChunker`] still hold;
/// only the chunk lengths vary.
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Errors
    ///
    /// Same parameter rules as [`FixedSizeChunker::new`].
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Find the best cut position in `lo..=hi`, searching from the right.
    fn find_cut(chars: &[char], lo: usize, hi: usize) -> Option<usize> {
        let paragraph = |p: usize| p >= 2 && chars[p - 1] == '\n' && chars[p - 2] == '\n';
        let sentence = |p: usize| {
            p >= 2 && chars[p - 1].is_whitespace() && matches!(chars[p - 2], '.' | '!' | '?')
        };
        let word = |p: usize| p >= 1 && chars[p - 1].is_whitespace();

        let levels: [&dyn Fn(usize) -> bool; 3] = [&paragraph, &sentence, &word];
        levels.iter().find_map(|is_boundary| (lo..=hi).rev().find(|&p| is_boundary(p)))
    }
}

impl Chunker for BoundaryChunker {
    fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let bounds = char_boundaries(text);
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let limit = (start + self.chunk_size).min(total);
            let end = if limit == total {
                total
            } else {
                // The cut must leave more than `chunk_overlap` characters so the
                // next start moves forward.
                let lo = (start + self.chunk_overlap + 1).max(start + self.chunk_size / 2);
                Self::find_cut(&chars, lo, limit).unwrap_or(limit)
            };

            chunks.push(make_chunk(text, &bounds, chunks.len(), start, end));
            if end == total {
                break;
            }
            start = end - self.chunk_overlap;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(split("abc", 0, 0), Err(RagError::Chunking(_))));
        assert!(matches!(split("abc", 10, 10), Err(RagError::Chunking(_))));
        assert!(matches!(split("abc", 10, 11), Err(RagError::Chunking(_))));
        assert!(BoundaryChunker::new(5, 5).is_err());
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split("", 10, 2).unwrap().is_empty());
        assert!(BoundaryChunker::new(10, 2).unwrap().split("").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split("Jane Doe, 5 years Python backend experience", 1000, 200).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, 0);
        assert_eq!(chunks[0].source_offset, 0);
        assert_eq!(chunks[0].text, "Jane Doe, 5 years Python backend experience");
    }

    #[test]
    fn fixed_chunks_step_by_size_minus_overlap() {
        let chunks = split("abcdefghijklmnopqrstuvwxyz", 10, 4).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcdefghij", "ghijklmnop", "mnopqrstuv", "stuvwxyz"]);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.source_offset).collect();
        assert_eq!(offsets, vec![0, 6, 12, 18]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ééééééé"; // 7 characters, 14 bytes
        let chunks = split(text, 4, 1).unwrap();
        assert_eq!(chunks[0].text, "éééé");
        assert_eq!(chunks[1].text, "éééé");
        assert_eq!(chunks[1].source_offset, 3);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn boundary_chunker_prefers_sentence_ends() {
        let text = "Built APIs in Python. Led a team of four. Shipped payments.";
        let chunks = BoundaryChunker::new(30, 5).unwrap().split(text);
        assert_eq!(chunks[0].text, "Built APIs in Python. ");
        assert!(chunks.iter().all(|c| c.char_len() <= 30));
        assert!(chunks.last().unwrap().text.ends_with("Shipped payments."));
    }

    #[test]
    fn boundary_chunker_prefers_paragraphs_over_sentences() {
        let text = "Skills. Rust. Go.\n\nExperience at Acme for five years.";
        let chunks = BoundaryChunker::new(24, 2).unwrap().split(text);
        assert_eq!(chunks[0].text, "Skills. Rust. Go.\n\n");
    }

    #[test]
    fn boundary_chunker_hard_cuts_unbroken_text() {
        let text = "x".repeat(25);
        let chunks = BoundaryChunker::new(10, 2).unwrap().split(&text);
        assert_eq!(chunks[0].char_len(), 10);
        assert_eq!(chunks[1].source_offset, 8);
    }
}
