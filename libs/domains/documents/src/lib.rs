//! Documents Domain Library
//!
//! Ingests text documents into a vector store and retrieves the closest
//! matches for a query, with per-document bookkeeping in a process-wide
//! request ledger.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ DocumentService  │  ← ingest / retrieve / list / get / delete
//! └──┬─────────┬─────┘
//!    │         │            ┌───────────────┐
//!    │         └───────────►│ RequestLedger │  (DashMap, per-key atomic)
//!    │                      └───────────────┘
//! ┌──▼────────────────┐     ┌───────────────────┐
//! │ VectorRepository  │     │ EmbeddingProvider │
//! │     (trait)       │     │      (trait)      │
//! └──┬────────────┬───┘     └──┬─────────────┬──┘
//!    │            │            │             │
//! InMemory…   QdrantRepository HashingProvider OpenAIProvider
//! ```
//!
//! Every stored vector has the configured dimension. `DocumentService::new`
//! refuses to start when the embedder or the repository disagrees with it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_documents::{
//!     DocumentConfig, DocumentService, HashingProvider, InMemoryVectorRepository,
//!     NewDocument, RequestLedger,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DocumentConfig::new(384);
//! let service = DocumentService::new(
//!     config,
//!     InMemoryVectorRepository::new(384),
//!     Arc::new(HashingProvider::new(384)?),
//!     Arc::new(RequestLedger::new()),
//! )
//! .await?;
//!
//! let receipt = service
//!     .ingest(NewDocument::new("hello world").with_metadata("source", "test".into()))
//!     .await?;
//!
//! let result = service.retrieve("hello world", Some(1)).await?;
//! assert_eq!(result.top().map(|m| m.id), Some(receipt.id));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use config::DocumentConfig;
pub use embedding::{EmbeddingProvider, HashingProvider, OpenAIConfig, OpenAIProvider};
pub use error::{DocumentError, DocumentResult, ErrorResponse, LedgerError};
pub use handlers::{DocumentApiDoc, router};
pub use ledger::{LedgerEntry, LedgerStats, RequestLedger};
pub use models::{
    DistanceMetric, Document, DocumentPage, DocumentPayload, EmbeddingModel,
    EmbeddingProviderType, IngestReceipt, Metadata, NewDocument, RepositoryHealth,
    RetrievalResult, ScoredDocument, ServiceHealth,
};
pub use qdrant::{QdrantConfig, QdrantRepository};
pub use repository::{InMemoryVectorRepository, VectorRepository};
pub use service::DocumentService;
