//! Text extraction from uploaded PDF documents.

use souvenir_core::TextExtractor;
use tracing::{debug, warn};

/// Appended to a document cut at the configured length.
pub const TRUNCATION_MARKER: &str = "\n\n[Document tronqué...]";

/// [`TextExtractor`] backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract_pdf(&self, bytes: &[u8]) -> anyhow::Result<String> {
        if bytes.is_empty() {
            anyhow::bail!("Empty PDF document");
        }
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow::anyhow!("Failed to extract PDF text: {e}"))?;
        let text = text.trim().to_string();
        if text.is_empty() {
            warn!("PDF contained no extractable text");
        } else {
            debug!("Extracted {} characters from PDF", text.chars().count());
        }
        Ok(text)
    }
}

/// Keep at most `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_with_marker("court", 10), "court");
        assert_eq!(truncate_with_marker("exact", 5), "exact");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let truncated = truncate_with_marker("éléphant", 3);
        assert_eq!(truncated, "élé\n\n[Document tronqué...]");
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(PdfExtractor.extract_pdf(b"not a pdf").is_err());
        assert!(PdfExtractor.extract_pdf(b"").is_err());
    }
}
