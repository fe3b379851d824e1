//! Document registry: which documents are processed and which tools each
//! one contributed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use docrouter_core::document::DocumentId;
use docrouter_tools::DocumentTools;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct DocumentEntry {
    pub doc_id: DocumentId,
    pub source: PathBuf,
    /// SHA-256 of the extracted text, hex encoded.
    pub fingerprint: String,
    pub segment_count: usize,
    pub tools: Arc<DocumentTools>,
    pub processed_at: DateTime<Utc>,
}

impl DocumentEntry {
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    pub fn has_summary(&self) -> bool {
        self.tools.summary.is_some()
    }
}

/// Processed documents keyed by name.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    entries: BTreeMap<DocumentId, DocumentEntry>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the replaced entry.
    pub fn insert(&mut self, entry: DocumentEntry) -> Option<DocumentEntry> {
        self.entries.insert(entry.doc_id.clone(), entry)
    }

    pub fn get(&self, doc_id: &DocumentId) -> Option<&DocumentEntry> {
        self.entries.get(doc_id)
    }

    pub fn contains(&self, doc_id: &DocumentId) -> bool {
        self.entries.contains_key(doc_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentEntry> {
        self.entries.values()
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.entries.keys().cloned().collect()
    }
}

/// Hex SHA-256 of `text`.
pub fn fingerprint(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
