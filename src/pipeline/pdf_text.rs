//! PDF text extraction.
//!
//! Pages are visited in document order. A page whose text cannot be
//! extracted, or extracts to nothing, contributes nothing; the rest are
//! concatenated with no separator between them.

use crate::error::FileError;
use lopdf::Document;
use tracing::{debug, warn};

/// Extract the text of every page of the PDF in `bytes`.
///
/// Fails only when the bytes are not a readable PDF container. An empty
/// string is a valid result (scanned documents, image-only pages).
pub fn extract_text(file: &str, bytes: &[u8]) -> Result<String, FileError> {
    let doc = Document::load_mem(bytes).map_err(|e| FileError::Extraction {
        file: file.to_string(),
        detail: format!("Could not read PDF: {e}"),
    })?;

    let pages = doc.get_pages();
    let mut text = String::new();
    let mut with_text = 0usize;

    for &number in pages.keys() {
        match doc.extract_text(&[number]) {
            Ok(page) if !page.is_empty() => {
                with_text += 1;
                text.push_str(&page);
            }
            Ok(_) => debug!("{}: page {} has no text", file, number),
            Err(e) => warn!("{}: skipping page {}: {}", file, number, e),
        }
    }

    debug!(
        "{}: extracted {} chars from {}/{} pages",
        file,
        text.len(),
        with_text,
        pages.len()
    );
    Ok(text)
}
