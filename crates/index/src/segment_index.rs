//! Per-document segment indexes: similarity search and summary mode.

use std::sync::Arc;

use docrouter_core::document::{DocumentId, Segment};
use docrouter_core::embedding::Embedder;
use docrouter_core::error::IndexBuildError;
use tracing::debug;

use crate::filter::MetadataFilter;
use crate::store::{IndexEntry, VectorIndex, embed_batched};

/// A retrieved segment and its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub score: f32,
}

/// One document's embedded segments.
pub struct SegmentIndex {
    doc_id: DocumentId,
    index: VectorIndex<Segment>,
    embedder: Arc<dyn Embedder>,
}

impl SegmentIndex {
    /// Embed `segments` and index them. Zero segments build an empty index.
    pub async fn build(
        doc_id: DocumentId,
        segments: Vec<Segment>,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self, IndexBuildError> {
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            embed_batched(embedder.as_ref(), &texts, batch_size).await?
        };

        let index: VectorIndex<Segment> = segments
            .into_iter()
            .zip(vectors)
            .map(|(payload, vector)| IndexEntry { payload, vector })
            .collect();

        debug!(doc_id = %doc_id, segments = index.len(), "Built segment index");

        Ok(Self {
            doc_id,
            index,
            embedder,
        })
    }

    pub fn doc_id(&self) -> &DocumentId {
        &self.doc_id
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Top-`k` segments by cosine similarity, restricted by `filter`.
    ///
    /// Equal scores keep document order. An empty index answers without
    /// calling the embedder.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredSegment>, IndexBuildError> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query).await?;

        let hits = self.index.search(
            &query_vector,
            k,
            |segment| filter.is_none_or(|f| f.matches(&segment.metadata)),
            |a, b| a.metadata.ordinal.cmp(&b.metadata.ordinal),
        );

        debug!(
            doc_id = %self.doc_id,
            k,
            filtered = filter.is_some(),
            hits = hits.len(),
            "Segment search"
        );

        Ok(hits
            .into_iter()
            .map(|hit| ScoredSegment {
                segment: hit.payload.clone(),
                score: hit.score,
            })
            .collect())
    }
}

impl std::fmt::Debug for SegmentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentIndex")
            .field("doc_id", &self.doc_id)
            .field("segments", &self.index.len())
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

/// Summary mode: every segment of a document in ordinal order.
#[derive(Debug, Clone)]
pub struct SummaryView {
    doc_id: DocumentId,
    segments: Vec<Segment>,
}

impl SummaryView {
    pub fn build(doc_id: DocumentId, mut segments: Vec<Segment>) -> Result<Self, IndexBuildError> {
        if segments.is_empty() {
            return Err(IndexBuildError::EmptyDocument {
                doc_id: doc_id.to_string(),
            });
        }
        segments.sort_by_key(|s| s.metadata.ordinal);
        Ok(Self { doc_id, segments })
    }

    pub fn doc_id(&self) -> &DocumentId {
        &self.doc_id
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn texts(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
