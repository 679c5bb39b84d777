//! PDF text extraction.
//!
//! Extraction runs in two tiers:
//! 1. `pdf-extract`, which handles font encodings well but can fail or panic
//!    on unusual files
//! 2. a `lopdf` content-stream walk, less accurate but tolerant of malformed
//!    documents
//!
//! Scanned, image-only pages have no text layer and come back as empty
//! strings. That is not an error here; callers decide whether a blank
//! document is usable.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, UnwindSafe};
use std::path::Path;
use std::sync::Once;

use lopdf::Object;
use tracing::{debug, info, warn};

use crate::document::ExtractedText;
use crate::error::{RagError, Result};

thread_local! {
    static SILENCED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, turning a panic into `Err` without printing it.
///
/// Panics on other threads, or outside `f`, still reach the previous hook.
fn catch_quietly<T>(f: impl FnOnce() -> T + UnwindSafe) -> std::result::Result<T, Box<dyn Any + Send>> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !SILENCED.with(Cell::get) {
                previous(info);
            }
        }));
    });

    SILENCED.with(|s| s.set(true));
    let outcome = panic::catch_unwind(f);
    SILENCED.with(|s| s.set(false));
    outcome
}

/// Extract page texts from a PDF held in memory.
///
/// # Errors
///
/// Returns [`RagError::Extraction`] if neither tier can parse the bytes.
pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText> {
    if bytes.is_empty() {
        return Err(RagError::Extraction("PDF stream is empty".to_string()));
    }

    let primary = catch_quietly(|| pdf_extract::extract_text_from_mem_by_pages(bytes));

    let pages = match primary {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            debug!(error = %e, "pdf-extract failed, trying lopdf fallback");
            extract_via_lopdf(bytes)?
        }
        Err(panic_payload) => {
            let message = panic_payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            debug!(panic = %message, "pdf-extract panicked, trying lopdf fallback");
            extract_via_lopdf(bytes)?
        }
    };

    let extracted = ExtractedText { pages };
    if extracted.is_blank() {
        warn!(
            page_count = extracted.page_count(),
            "PDF has no extractable text layer (image-only or scanned?)"
        );
    } else {
        info!(
            page_count = extracted.page_count(),
            char_count = extracted.pages.iter().map(|p| p.chars().count()).sum::<usize>(),
            "extracted PDF text"
        );
    }
    Ok(extracted)
}

/// Read a PDF from disk and extract its page texts.
///
/// # Errors
///
/// Returns [`RagError::Extraction`] if the file cannot be read or parsed.
pub fn extract_file(path: &Path) -> Result<ExtractedText> {
    let bytes = std::fs::read(path).map_err(|e| {
        RagError::Extraction(format!("cannot read '{}': {e}", path.display()))
    })?;
    extract_pdf(&bytes)
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    // UTF-16BE with byte-order mark
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    // Latin-1 / PDFDocEncoding fallback treats each byte as a code point.
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}

fn extract_via_lopdf(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| RagError::Extraction(format!("not a readable PDF: {e}")))?;

    let mut pages = Vec::new();
    for (_page_number, page_id) in doc.get_pages() {
        let mut text = String::new();
        let operations = doc
            .get_page_content(page_id)
            .ok()
            .and_then(|content| lopdf::content::Content::decode(&content).ok())
            .map(|c| c.operations)
            .unwrap_or_default();

        for op in operations {
            match op.operator.as_str() {
                "Tj" | "'" | "\"" => {
                    if let Some(Object::String(bytes, _)) = op.operands.last() {
                        text.push_str(&decode_pdf_string(bytes));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        for item in items {
                            if let Object::String(bytes, _) = item {
                                text.push_str(&decode_pdf_string(bytes));
                            }
                        }
                    }
                }
                "Td" | "TD" | "T*" => {
                    if !text.is_empty() && !text.ends_with(['\n', ' ']) {
                        text.push(' ');
                    }
                }
                "ET" => {
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }
        pages.push(text);
    }

    if pages.is_empty() {
        return Err(RagError::Extraction("PDF has no pages".to_string()));
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_catch_returns_the_panic_and_rearms() {
        let caught = catch_quietly(|| -> u32 { panic!("bad xref") });
        let payload = caught.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"bad xref"));
        assert!(!SILENCED.with(Cell::get));

        assert_eq!(catch_quietly(|| 7).unwrap(), 7);
        assert!(!SILENCED.with(Cell::get));
    }

    #[test]
    fn rejects_empty_and_garbage_streams() {
        assert!(matches!(extract_pdf(b""), Err(RagError::Extraction(_))));
        assert!(matches!(extract_pdf(b"definitely not a pdf"), Err(RagError::Extraction(_))));
    }

    #[test]
    fn decodes_utf16_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, b'O', 0x00, b'K'];
        assert_eq!(decode_pdf_string(&bytes), "OK");
    }

    #[test]
    fn decodes_latin1_bytes() {
        assert_eq!(decode_pdf_string(&[b'C', 0xE9, b'S']), "CéS");
    }

    #[test]
    fn missing_file_is_an_extraction_error() {
        let err = extract_file(Path::new("/nonexistent/resume.pdf")).unwrap_err();
        assert!(matches!(err, RagError::Extraction(_)));
    }
}
