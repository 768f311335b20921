use std::time::Duration;

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{DocumentError, DocumentResult};
use crate::models::{EmbeddingModel, EmbeddingProviderType};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI embedding provider configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: EmbeddingModel,
    /// Requested output dimension
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: String, model: EmbeddingModel) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            dimension: model.native_dimension(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn validate(&self) -> DocumentResult<()> {
        if self.dimension == 0 || self.dimension > self.model.native_dimension() {
            return Err(DocumentError::Config(format!(
                "{} supports dimensions 1..={}, got {}",
                self.model.model_name(),
                self.model.native_dimension(),
                self.dimension
            )));
        }
        if !self.model.supports_shortening() && self.dimension != self.model.native_dimension() {
            return Err(DocumentError::Config(format!(
                "{} only produces {}-dimensional vectors",
                self.model.model_name(),
                self.model.native_dimension()
            )));
        }
        Ok(())
    }
}

impl FromEnv for OpenAIConfig {
    /// Reads:
    /// - OPENAI_API_KEY (required)
    /// - OPENAI_BASE_URL (default: https://api.openai.com/v1)
    /// - OPENAI_EMBEDDING_MODEL (default: text-embedding-3-small)
    /// - EMBEDDING_DIMENSION (default: the model's native dimension)
    /// - OPENAI_TIMEOUT_SECS (default: 30)
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("OPENAI_API_KEY")?;
        let base_url = env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL);

        let model_name = env_or_default("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small");
        let model =
            EmbeddingModel::from_model_name(&model_name).ok_or_else(|| ConfigError::ParseError {
                key: "OPENAI_EMBEDDING_MODEL".to_string(),
                details: format!("unknown embedding model '{}'", model_name),
            })?;

        let dimension = env_parse("EMBEDDING_DIMENSION", model.native_dimension())?;
        let timeout_secs = env_parse("OPENAI_TIMEOUT_SECS", 30u64)?;

        Ok(Self {
            api_key,
            base_url,
            model,
            dimension,
            timeout_secs,
        })
    }
}

/// OpenAI embeddings provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> DocumentResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocumentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> DocumentResult<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    fn requested_dimensions(&self) -> Option<u32> {
        self.config
            .model
            .supports_shortening()
            .then_some(self.config.dimension as u32)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::OpenAI
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DocumentResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(DocumentError::Embedding("input text is empty".to_string()));
        }

        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| DocumentError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> DocumentResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: self.config.model.model_name(),
            input: texts,
            dimensions: self.requested_dimensions(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocumentError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response.json().await?;

        // Sort by index to maintain order
        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        if data.len() != texts.len() {
            return Err(DocumentError::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                data.len(),
                texts.len()
            )));
        }

        data.into_iter()
            .map(|d| {
                if d.embedding.len() == self.config.dimension {
                    Ok(d.embedding)
                } else {
                    Err(DocumentError::Embedding(format!(
                        "OpenAI returned a {}-dimensional embedding, expected {}",
                        d.embedding.len(),
                        self.config.dimension
                    )))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortened_dimension_is_requested() {
        let config = OpenAIConfig::new("key".into(), EmbeddingModel::TextEmbedding3Small)
            .with_dimension(384);
        let provider = OpenAIProvider::new(config).unwrap();
        assert_eq!(provider.dimension(), 384);
        assert_eq!(provider.requested_dimensions(), Some(384));
    }

    #[test]
    fn test_ada_never_sends_dimensions() {
        let config = OpenAIConfig::new("key".into(), EmbeddingModel::TextEmbeddingAda002);
        let provider = OpenAIProvider::new(config).unwrap();
        assert_eq!(provider.dimension(), 1536);
        assert_eq!(provider.requested_dimensions(), None);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let too_large = OpenAIConfig::new("key".into(), EmbeddingModel::TextEmbedding3Small)
            .with_dimension(4096);
        assert!(matches!(
            OpenAIProvider::new(too_large),
            Err(DocumentError::Config(_))
        ));

        let ada_shortened = OpenAIConfig::new("key".into(), EmbeddingModel::TextEmbeddingAda002)
            .with_dimension(256);
        assert!(matches!(
            OpenAIProvider::new(ada_shortened),
            Err(DocumentError::Config(_))
        ));
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_BASE_URL", None),
                ("OPENAI_EMBEDDING_MODEL", Some("text-embedding-3-large")),
                ("EMBEDDING_DIMENSION", Some("1024")),
                ("OPENAI_TIMEOUT_SECS", None),
            ],
            || {
                let config = OpenAIConfig::from_env().unwrap();
                assert_eq!(config.api_key, "sk-test");
                assert_eq!(config.base_url, DEFAULT_BASE_URL);
                assert_eq!(config.model, EmbeddingModel::TextEmbedding3Large);
                assert_eq!(config.dimension, 1024);
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_config_from_env_requires_api_key() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            let err = OpenAIConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("OPENAI_API_KEY"));
        });
    }

    #[test]
    fn test_config_from_env_rejects_unknown_model() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_EMBEDDING_MODEL", Some("gpt-4")),
            ],
            || {
                let err = OpenAIConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("OPENAI_EMBEDDING_MODEL"));
            },
        );
    }

    #[tokio::test]
    async fn test_empty_input_rejected_without_request() {
        let config = OpenAIConfig::new("key".into(), EmbeddingModel::TextEmbedding3Small)
            .with_base_url("http://127.0.0.1:9".into());
        let provider = OpenAIProvider::new(config).unwrap();
        assert!(matches!(
            provider.embed("  ").await,
            Err(DocumentError::Embedding(_))
        ));
    }
}
