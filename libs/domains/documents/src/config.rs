use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_parse};

use crate::models::DistanceMetric;

/// Settings consumed by [`crate::DocumentService`]
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentConfig {
    /// Embedding dimension every stored vector must have
    pub dimension: usize,
    pub metric: DistanceMetric,
    /// Result count when a retrieval or list request gives none
    pub default_limit: usize,
    /// Upper bound applied to every requested limit
    pub max_limit: usize,
    /// Documents embedded and stored concurrently by `batch_ingest`
    pub batch_concurrency: usize,
    /// Deadline for each repository call
    pub repository_timeout: Duration,
}

impl DocumentConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    pub fn with_batch_concurrency(mut self, batch_concurrency: usize) -> Self {
        self.batch_concurrency = batch_concurrency;
        self
    }

    pub fn with_repository_timeout(mut self, timeout: Duration) -> Self {
        self.repository_timeout = timeout;
        self
    }

    /// Resolve a caller-supplied limit against the configured default and cap
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, details: &str| ConfigError::ParseError {
            key: key.to_string(),
            details: details.to_string(),
        };

        if self.dimension == 0 {
            return Err(invalid("EMBEDDING_DIMENSION", "must be greater than zero"));
        }
        if self.max_limit == 0 {
            return Err(invalid("RETRIEVAL_MAX_LIMIT", "must be greater than zero"));
        }
        if self.default_limit > self.max_limit {
            return Err(invalid(
                "RETRIEVAL_DEFAULT_LIMIT",
                "must not exceed RETRIEVAL_MAX_LIMIT",
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(invalid("BATCH_CONCURRENCY", "must be greater than zero"));
        }
        if self.repository_timeout.is_zero() {
            return Err(invalid("REPOSITORY_TIMEOUT_MS", "must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            metric: DistanceMetric::Cosine,
            default_limit: 10,
            max_limit: 100,
            batch_concurrency: 8,
            repository_timeout: Duration::from_millis(5000),
        }
    }
}

impl FromEnv for DocumentConfig {
    /// Reads:
    /// - EMBEDDING_DIMENSION (default: 384)
    /// - SIMILARITY_METRIC (default: cosine)
    /// - RETRIEVAL_DEFAULT_LIMIT (default: 10)
    /// - RETRIEVAL_MAX_LIMIT (default: 100)
    /// - BATCH_CONCURRENCY (default: 8)
    /// - REPOSITORY_TIMEOUT_MS (default: 5000)
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            dimension: env_parse("EMBEDDING_DIMENSION", 384usize)?,
            metric: env_parse("SIMILARITY_METRIC", DistanceMetric::default())?,
            default_limit: env_parse("RETRIEVAL_DEFAULT_LIMIT", 10usize)?,
            max_limit: env_parse("RETRIEVAL_MAX_LIMIT", 100usize)?,
            batch_concurrency: env_parse("BATCH_CONCURRENCY", 8usize)?,
            repository_timeout: Duration::from_millis(env_parse("REPOSITORY_TIMEOUT_MS", 5000u64)?),
        };
        config.validate()?;
        Ok(config)
    }
}
