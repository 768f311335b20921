use core_config::{ConfigError, FromEnv, env_or_default, env_parse};

use crate::models::DistanceMetric;

const DEFAULT_URL: &str = "http://localhost:6334";
const DEFAULT_COLLECTION: &str = "documents";

/// Qdrant connection and collection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub collection: String,
    /// Vector size used when the collection has to be created
    pub dimension: usize,
    pub metric: DistanceMetric,
}

impl QdrantConfig {
    pub fn new(url: String, dimension: usize) -> Self {
        Self {
            url,
            dimension,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }
}

impl FromEnv for QdrantConfig {
    /// Reads:
    /// - QDRANT_URL (default: http://localhost:6334)
    /// - QDRANT_API_KEY (optional)
    /// - QDRANT_TIMEOUT_SECS (default: 30)
    /// - QDRANT_COLLECTION (default: documents)
    /// - EMBEDDING_DIMENSION (default: 384)
    /// - SIMILARITY_METRIC (default: cosine)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_or_default("QDRANT_URL", DEFAULT_URL),
            api_key: std::env::var("QDRANT_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            timeout_secs: env_parse("QDRANT_TIMEOUT_SECS", 30u64)?,
            collection: env_or_default("QDRANT_COLLECTION", DEFAULT_COLLECTION),
            dimension: env_parse("EMBEDDING_DIMENSION", 384usize)?,
            metric: env_parse("SIMILARITY_METRIC", DistanceMetric::default())?,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
            collection: DEFAULT_COLLECTION.to_string(),
            dimension: 384,
            metric: DistanceMetric::Cosine,
        }
    }
}
