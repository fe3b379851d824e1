//! Plain-text extraction.
//!
//! Reads a UTF-8 file and splits it into pages on form feeds (`\x0C`), the
//! page separator emitted by `pdftotext` and most text exporters. Pages are
//! labelled `"1"`, `"2"`, … so the vector tool can filter by page number.

use async_trait::async_trait;
use docrouter_core::document::{ExtractedDocument, Page, TextExtractor};
use docrouter_core::error::ExtractionError;
use std::path::Path;
use tracing::debug;

const PAGE_BREAK: char = '\u{0C}';

/// Binary formats this extractor refuses instead of reading as garbage text.
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "epub", "zip", "gz", "png", "jpg",
    "jpeg", "gif", "webp",
];

/// Extracts UTF-8 text files, one page per form-feed-separated block.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Split raw text into labelled pages.
    pub fn paginate(text: &str) -> ExtractedDocument {
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        let text = text.strip_suffix(PAGE_BREAK).unwrap_or(text);

        let pages = text
            .split(PAGE_BREAK)
            .enumerate()
            .map(|(i, page)| Page {
                label: Some((i + 1).to_string()),
                text: page.to_string(),
            })
            .collect();

        ExtractedDocument { pages }
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain_text"
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractionError> {
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            let extension = extension.to_ascii_lowercase();
            if BINARY_EXTENSIONS.contains(&extension.as_str()) {
                return Err(ExtractionError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension,
                });
            }
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExtractionError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let text = String::from_utf8(bytes).map_err(|_| ExtractionError::Corrupt {
            path: path.to_path_buf(),
        })?;

        let document = Self::paginate(&text);
        debug!(
            path = %path.display(),
            pages = document.pages.len(),
            bytes = text.len(),
            "Extracted text"
        );
        Ok(document)
    }
}
