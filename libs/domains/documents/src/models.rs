use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::ledger::LedgerStats;

/// Caller-supplied document metadata. Opaque to the service.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Similarity metric used to rank stored vectors against a query.
///
/// Both metrics score "higher is more similar", so ranked results are always
/// ordered by descending score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    #[strum(to_string = "dot_product", serialize = "dot")]
    #[serde(alias = "dot")]
    DotProduct,
}

impl DistanceMetric {
    /// Score `candidate` against `query`. Both slices must have equal length.
    pub fn score(&self, query: &[f32], candidate: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_similarity(query, candidate),
            DistanceMetric::DotProduct => dot_product(query, candidate),
        }
    }
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product(a, b) / (norm_a * norm_b)
}

/// Embedding provider types
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmbeddingProviderType {
    /// Deterministic in-process feature hashing
    #[default]
    Hashing,
    OpenAI,
}

/// OpenAI embedding model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum EmbeddingModel {
    /// text-embedding-3-small (1536 dimensions, shortenable)
    #[default]
    TextEmbedding3Small,
    /// text-embedding-3-large (3072 dimensions, shortenable)
    TextEmbedding3Large,
    /// text-embedding-ada-002 (1536 dimensions, fixed)
    TextEmbeddingAda002,
}

impl EmbeddingModel {
    pub fn native_dimension(&self) -> usize {
        match self {
            EmbeddingModel::TextEmbedding3Small => 1536,
            EmbeddingModel::TextEmbedding3Large => 3072,
            EmbeddingModel::TextEmbeddingAda002 => 1536,
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large => "text-embedding-3-large",
            EmbeddingModel::TextEmbeddingAda002 => "text-embedding-ada-002",
        }
    }

    /// Whether the API accepts a `dimensions` parameter for this model
    pub fn supports_shortening(&self) -> bool {
        !matches!(self, EmbeddingModel::TextEmbeddingAda002)
    }

    pub fn from_model_name(name: &str) -> Option<Self> {
        match name {
            "text-embedding-3-small" => Some(EmbeddingModel::TextEmbedding3Small),
            "text-embedding-3-large" => Some(EmbeddingModel::TextEmbedding3Large),
            "text-embedding-ada-002" => Some(EmbeddingModel::TextEmbeddingAda002),
            _ => None,
        }
    }
}

/// Input for ingesting a document
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewDocument {
    pub content: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

impl NewDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Record persisted alongside each vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentPayload {
    pub content: String,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    pub ingested_at: DateTime<Utc>,
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    /// Unique identifier, assigned at ingestion
    pub id: Uuid,
    /// Original text
    pub content: String,
    /// Caller metadata, passed through unmodified
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    /// Embedding computed at ingestion
    pub vector: Vec<f32>,
    /// Ingestion timestamp
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    pub fn from_parts(id: Uuid, vector: Vec<f32>, payload: DocumentPayload) -> Self {
        Self {
            id,
            content: payload.content,
            metadata: payload.metadata,
            vector,
            ingested_at: payload.ingested_at,
        }
    }
}

/// A single ranked retrieval hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoredDocument {
    pub id: Uuid,
    pub score: f32,
    pub payload: DocumentPayload,
}

/// Ranked retrieval output, ordered by descending score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RetrievalResult {
    pub matches: Vec<ScoredDocument>,
}

impl RetrievalResult {
    pub fn new(matches: Vec<ScoredDocument>) -> Self {
        Self { matches }
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.matches.iter().map(|m| m.id).collect()
    }

    pub fn top(&self) -> Option<&ScoredDocument> {
        self.matches.first()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// One page of stored documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    /// Pass back as `cursor` to fetch the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

/// Result of a successful ingest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngestReceipt {
    pub id: Uuid,
    /// Ledger count after this ingest; `None` when the ledger update failed
    pub ledger_count: Option<u64>,
}

impl IngestReceipt {
    /// The document is stored but its ledger bookkeeping was not recorded
    pub fn is_degraded(&self) -> bool {
        self.ledger_count.is_none()
    }
}

/// Metadata reported by a repository health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RepositoryHealth {
    pub backend: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub entry_count: u64,
}

/// Aggregated health for the document service
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceHealth {
    pub dimension: usize,
    pub embedding_provider: EmbeddingProviderType,
    pub repository: RepositoryHealth,
    pub ledger: LedgerStats,
}
