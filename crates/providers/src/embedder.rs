//! Embedding oracle adapters.
//!
//! [`ProviderEmbedder`] sends batches to any provider's `/embeddings`
//! endpoint. [`HashEmbedder`] is a deterministic, offline bag-of-words
//! encoder used by tests and by `embedding.provider = "hash"`.

use async_trait::async_trait;
use docrouter_core::embedding::Embedder;
use docrouter_core::error::ProviderError;
use docrouter_core::provider::{EmbeddingRequest, Provider};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Embeds texts through a [`Provider`], `batch_size` texts per request.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    batch_size: usize,
    name: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let model = model.into();
        let name = format!("{}:{}", provider.name(), model);
        Self {
            provider,
            model,
            batch_size: 64,
            name,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut vectors = Vec::with_capacity(inputs.len());

        for batch in inputs.chunks(self.batch_size) {
            let response = self
                .provider
                .embed(EmbeddingRequest {
                    model: self.model.clone(),
                    inputs: batch.to_vec(),
                })
                .await?;

            if response.embeddings.len() != batch.len() {
                return Err(ProviderError::Malformed(format!(
                    "{} returned {} embeddings for {} inputs",
                    self.name,
                    response.embeddings.len(),
                    batch.len()
                )));
            }

            debug!(embedder = %self.name, batch = batch.len(), "Embedded batch");
            vectors.extend(response.embeddings);
        }

        Ok(vectors)
    }
}

/// Feature-hashed bag of lowercase words, L2-normalized.
///
/// Texts sharing words get a positive cosine similarity, which is enough
/// for routing questions to documents without a network round trip.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimensions];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let mut slot = [0u8; 8];
            slot.copy_from_slice(&digest[..8]);
            let position = (u64::from_le_bytes(slot) % self.dimensions as u64) as usize;
            embedding[position] += 1.0;
        }

        let norm = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(inputs.iter().map(|text| self.encode(text)).collect())
    }
}
