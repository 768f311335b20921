use async_trait::async_trait;

use crate::error::DocumentResult;
use crate::models::EmbeddingProviderType;

/// Trait for embedding generation providers
///
/// A provider is configured with a fixed output dimension and returns vectors
/// of exactly that length for every input it accepts. Inputs it cannot
/// process fail with `DocumentError::Embedding`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> EmbeddingProviderType;

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> DocumentResult<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order
    async fn embed_batch(&self, texts: &[String]) -> DocumentResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}
