//! Metadata filters for segment search.

use std::collections::BTreeSet;

use docrouter_core::document::SegmentMetadata;

/// Key used for page filters.
pub const PAGE_LABEL: &str = "page_label";

/// Accepts a segment whose `key` field equals any of `values` (OR semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    pub key: String,
    pub values: BTreeSet<String>,
}

impl MetadataFilter {
    /// Build a filter from raw values. Blank values are dropped; an empty set
    /// yields `None`, meaning "no filter".
    pub fn any_of<I, S>(key: impl Into<String>, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: BTreeSet<String> = values
            .into_iter()
            .filter_map(|v| non_empty(v.as_ref()).map(str::to_string))
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(Self {
                key: key.into(),
                values,
            })
        }
    }

    /// Filter on page labels.
    pub fn pages<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::any_of(PAGE_LABEL, labels)
    }

    pub fn matches(&self, metadata: &SegmentMetadata) -> bool {
        metadata
            .field(&self.key)
            .is_some_and(|value| self.values.contains(value))
    }
}

fn non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
