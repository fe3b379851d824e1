//! Embedder trait: the abstraction over the text-embedding oracle.

use async_trait::async_trait;
use crate::error::ProviderError;

/// Turns texts into fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// A human-readable name (e.g., "openai:text-embedding-3-small", "hash").
    fn name(&self) -> &str;

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed a single text.
    async fn embed_one(&self, input: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed(vec![input.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed(format!("{} returned no embedding", self.name())))
    }
}
