//! Deterministic embedders for index tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docrouter_core::embedding::Embedder;
use docrouter_core::error::ProviderError;

/// One dimension per keyword: a text's vector counts keyword occurrences.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs
            .iter()
            .map(|text| {
                let text = text.to_lowercase();
                self.keywords
                    .iter()
                    .map(|k| text.matches(k.as_str()).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Always returns one vector fewer than asked for.
pub struct ShortEmbedder;

#[async_trait]
impl Embedder for ShortEmbedder {
    fn name(&self) -> &str {
        "short"
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(vec![vec![1.0]; inputs.len().saturating_sub(1)])
    }
}
