//! A flat vector store generic over its payload.

use std::cmp::Ordering;

use docrouter_core::embedding::Embedder;
use docrouter_core::error::IndexBuildError;
use tracing::debug;

use crate::vector::cosine_similarity;

/// One stored payload with its vector.
#[derive(Debug, Clone)]
pub struct IndexEntry<P> {
    pub payload: P,
    pub vector: Vec<f32>,
}

/// A search hit borrowed from the index.
#[derive(Debug, Clone, Copy)]
pub struct Scored<'a, P> {
    pub payload: &'a P,
    pub score: f32,
}

/// Exhaustive cosine-similarity index. Suitable for the few hundred to few
/// thousand entries a document set produces.
#[derive(Debug, Clone)]
pub struct VectorIndex<P> {
    entries: Vec<IndexEntry<P>>,
}

impl<P> VectorIndex<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, payload: P, vector: Vec<f32>) {
        self.entries.push(IndexEntry { payload, vector });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry<P>> {
        self.entries.iter()
    }

    /// Rank entries accepted by `keep` against `query`.
    ///
    /// Results are sorted by descending score; equal scores are ordered by
    /// `tie_break` so the ranking is deterministic.
    pub fn search<F, T>(&self, query: &[f32], k: usize, keep: F, tie_break: T) -> Vec<Scored<'_, P>>
    where
        F: Fn(&P) -> bool,
        T: Fn(&P, &P) -> Ordering,
    {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<Scored<'_, P>> = self
            .entries
            .iter()
            .filter(|entry| keep(&entry.payload))
            .map(|entry| Scored {
                payload: &entry.payload,
                score: cosine_similarity(&entry.vector, query),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| tie_break(a.payload, b.payload))
        });
        scored.truncate(k);
        scored
    }
}

impl<P> Default for VectorIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> FromIterator<IndexEntry<P>> for VectorIndex<P> {
    fn from_iter<I: IntoIterator<Item = IndexEntry<P>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Embed `texts` in batches of `batch_size`, checking that the oracle
/// returns exactly one vector per input.
pub async fn embed_batched(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, IndexBuildError> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size) {
        let embedded = embedder.embed(batch.to_vec()).await?;
        if embedded.len() != batch.len() {
            return Err(IndexBuildError::EmbeddingCountMismatch {
                expected: batch.len(),
                actual: embedded.len(),
            });
        }
        vectors.extend(embedded);
    }

    debug!(embedder = embedder.name(), count = vectors.len(), "Embedded texts");
    Ok(vectors)
}
