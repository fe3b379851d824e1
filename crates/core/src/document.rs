//! Document domain types: identifiers, extracted pages and segments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ExtractionError;

/// The unique, user-chosen name of a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a document id from a name. Returns `None` for blank names.
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document to process: a name plus where its file lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSource {
    pub name: String,
    pub path: PathBuf,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Position metadata carried by every segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Page label copied from the extraction, when the source has pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,

    /// Position of the segment in the document, starting at 0.
    pub ordinal: usize,

    /// The owning document.
    pub doc_id: DocumentId,
}

impl SegmentMetadata {
    /// Look up a filterable metadata field by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "page_label" => self.page_label.as_deref(),
            "doc_id" => Some(self.doc_id.as_str()),
            _ => None,
        }
    }
}

/// A bounded-size slice of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub metadata: SegmentMetadata,
}

/// One page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub text: String,
}

/// The full text of a document, page by page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub pages: Vec<Page>,
}

impl ExtractedDocument {
    /// A single unlabelled page holding all of `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pages: vec![Page {
                label: None,
                text: text.into(),
            }],
        }
    }

    /// Whether the document contains no non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }

    /// All page texts joined, used for content fingerprints.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\u{0C}")
    }
}

/// Turns a file into text. Implementations decide which formats they accept.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// A human-readable name for this extractor.
    fn name(&self) -> &str;

    async fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractionError>;
}
