//! Deterministic feature-hashing embedder.
//!
//! Text is lower-cased and split on non-alphanumeric characters. Every token
//! and every adjacent token pair is hashed with SHA-256 into one of
//! `dimension` buckets with a hash-derived sign, then the vector is
//! L2-normalized. The output depends only on the input text and the
//! configured dimension, so identical inputs always produce identical vectors.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::EmbeddingProvider;
use crate::error::{DocumentError, DocumentResult};
use crate::models::EmbeddingProviderType;

pub const DEFAULT_MAX_INPUT_CHARS: usize = 32 * 1024;

const BIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
    max_input_chars: usize,
}

impl HashingProvider {
    pub fn new(dimension: usize) -> DocumentResult<Self> {
        if dimension == 0 {
            return Err(DocumentError::Config(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            dimension,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        })
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let digest = Sha256::digest(feature);
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn compute(&self, text: &str) -> DocumentResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(DocumentError::Embedding(
                "input text is empty".to_string(),
            ));
        }

        let chars = text.chars().count();
        if chars > self.max_input_chars {
            return Err(DocumentError::Embedding(format!(
                "input text has {} characters, limit is {}",
                chars, self.max_input_chars
            )));
        }

        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return Err(DocumentError::Embedding(
                "input text contains no indexable tokens".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{}\u{1f}{}", pair[0], pair[1]);
            self.accumulate(&mut vector, bigram.as_bytes(), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            // All features cancelled out.
            vector[0] = 1.0;
            return Ok(vector);
        }
        vector.iter_mut().for_each(|v| *v /= norm);

        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::Hashing
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DocumentResult<Vec<f32>> {
        self.compute(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DistanceMetric;

    #[tokio::test]
    async fn test_output_has_configured_dimension() {
        let provider = HashingProvider::new(384).unwrap();
        let vector = provider.embed("hello world").await.unwrap();
        assert_eq!(vector.len(), 384);

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let a = HashingProvider::new(64).unwrap();
        let b = HashingProvider::new(64).unwrap();
        assert_eq!(
            a.embed("The quick brown fox").await.unwrap(),
            b.embed("The quick brown fox").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_case_and_punctuation_insensitive() {
        let provider = HashingProvider::new(128).unwrap();
        let a = provider.embed("Hello, World!").await.unwrap();
        let b = provider.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher_than_unrelated() {
        let provider = HashingProvider::new(512).unwrap();
        let query = provider.embed("rust vector database").await.unwrap();
        let related = provider
            .embed("a vector database written in rust")
            .await
            .unwrap();
        let unrelated = provider.embed("banana bread recipe").await.unwrap();

        let metric = DistanceMetric::Cosine;
        assert!(metric.score(&query, &related) > metric.score(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_rejects_empty_input() {
        let provider = HashingProvider::new(16).unwrap();
        assert!(matches!(
            provider.embed("").await,
            Err(DocumentError::Embedding(_))
        ));
        assert!(matches!(
            provider.embed("   \n\t").await,
            Err(DocumentError::Embedding(_))
        ));
        assert!(matches!(
            provider.embed("?!...").await,
            Err(DocumentError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_oversized_input() {
        let provider = HashingProvider::new(16).unwrap().with_max_input_chars(10);
        assert!(provider.embed("short").await.is_ok());

        let err = provider.embed("this is far too long").await.unwrap_err();
        assert!(matches!(err, DocumentError::Embedding(msg) if msg.contains("limit is 10")));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            HashingProvider::new(0),
            Err(DocumentError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let provider = HashingProvider::new(32).unwrap();
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], provider.embed("alpha").await.unwrap());
        assert_eq!(batch[1], provider.embed("beta").await.unwrap());
    }
}
