use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::DocumentConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{DocumentError, DocumentResult};
use crate::ledger::RequestLedger;
use crate::models::{
    Document, DocumentPage, DocumentPayload, IngestReceipt, NewDocument, RetrievalResult,
    ServiceHealth,
};
use crate::repository::{VectorRepository, zero_list_limit};

/// Document lifecycle and retrieval orchestration
///
/// Ingest embeds the content, stores it under a fresh UUIDv7 and records the
/// mutation in the ledger. Retrieval embeds the query and returns the
/// repository ranking unmodified. No lock is held across an embedding or
/// repository call.
pub struct DocumentService<R: VectorRepository> {
    repository: R,
    embedder: Arc<dyn EmbeddingProvider>,
    ledger: Arc<RequestLedger>,
    config: DocumentConfig,
}

impl<R: VectorRepository> DocumentService<R> {
    /// Wire the service together, checking that the embedder and the
    /// repository agree with the configured dimension and metric.
    pub async fn new(
        config: DocumentConfig,
        repository: R,
        embedder: Arc<dyn EmbeddingProvider>,
        ledger: Arc<RequestLedger>,
    ) -> DocumentResult<Self> {
        config.validate()?;

        if embedder.dimension() != config.dimension {
            return Err(DocumentError::DimensionMismatch {
                expected: config.dimension,
                actual: embedder.dimension(),
            });
        }

        let service = Self {
            repository,
            embedder,
            ledger,
            config,
        };

        let health = service
            .with_deadline("health_check", service.repository.health_check())
            .await?;

        if health.dimension != service.config.dimension {
            return Err(DocumentError::DimensionMismatch {
                expected: service.config.dimension,
                actual: health.dimension,
            });
        }
        if health.metric != service.config.metric {
            return Err(DocumentError::Config(format!(
                "Repository uses {} similarity, configured {}",
                health.metric, service.config.metric
            )));
        }

        info!(
            backend = %health.backend,
            dimension = service.config.dimension,
            metric = %service.config.metric,
            embedding_provider = %service.embedder.provider_type(),
            "Document service ready"
        );

        Ok(service)
    }

    /// Read-only view of the request ledger
    pub fn ledger(&self) -> &RequestLedger {
        &self.ledger
    }

    /// Ingest one document and return its new id.
    ///
    /// Nothing is stored when embedding fails. A ledger failure after the
    /// document is stored yields a receipt without a ledger count.
    #[tracing::instrument(skip(self, input), fields(content_len = input.content.len()))]
    pub async fn ingest(&self, input: NewDocument) -> DocumentResult<IngestReceipt> {
        self.store(Uuid::now_v7(), input).await
    }

    /// Ingest every document independently, with bounded concurrency.
    ///
    /// Returns one result per input, in input order.
    #[tracing::instrument(skip(self, inputs), fields(batch_size = inputs.len()))]
    pub async fn batch_ingest(
        &self,
        inputs: Vec<NewDocument>,
    ) -> Vec<DocumentResult<IngestReceipt>> {
        let results: Vec<_> = stream::iter(inputs)
            .map(|input| self.ingest(input))
            .buffered(self.config.batch_concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            succeeded = results.len() - failed,
            failed, "Batch ingest finished"
        );

        results
    }

    /// Top matches for `query`, by descending score.
    ///
    /// `None` uses the configured default limit; every limit is capped at
    /// the configured maximum. A zero limit returns an empty result without
    /// embedding or searching.
    #[tracing::instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> DocumentResult<RetrievalResult> {
        let limit = self.config.effective_limit(limit);
        if limit == 0 {
            return Ok(RetrievalResult::default());
        }

        let vector = self.embed(query).await?;
        let matches = self
            .with_deadline("search", self.repository.search(vector, limit))
            .await?;

        debug!(limit, returned = matches.len(), "Retrieved documents");
        Ok(RetrievalResult::new(matches))
    }

    #[tracing::instrument(skip(self), fields(document_id = %id))]
    pub async fn get_document(&self, id: Uuid) -> DocumentResult<Document> {
        self.with_deadline("get", self.repository.get(id))
            .await?
            .ok_or(DocumentError::NotFound(id))
    }

    /// One page of stored documents.
    ///
    /// A zero limit is rejected: an empty page without a cursor would read
    /// as the end of the collection.
    #[tracing::instrument(skip(self))]
    pub async fn list_documents(
        &self,
        limit: Option<usize>,
        cursor: Option<String>,
    ) -> DocumentResult<DocumentPage> {
        let limit = self.config.effective_limit(limit);
        if limit == 0 {
            return Err(zero_list_limit());
        }
        self.with_deadline("list", self.repository.list(limit, cursor))
            .await
    }

    /// Delete a document. Returns `false` when it was already absent.
    #[tracing::instrument(skip(self), fields(document_id = %id))]
    pub async fn delete_document(&self, id: Uuid) -> DocumentResult<bool> {
        let removed = self
            .with_deadline("delete", self.repository.delete(id))
            .await?;

        if !removed {
            debug!("Document already absent");
            return Ok(false);
        }

        if let Err(e) = self.ledger.record_deletion(&id.to_string()) {
            warn!(error = %e, "Document deleted but ledger update failed");
        }

        info!("Document deleted");
        Ok(true)
    }

    pub async fn health(&self) -> DocumentResult<ServiceHealth> {
        let repository = self
            .with_deadline("health_check", self.repository.health_check())
            .await?;

        Ok(ServiceHealth {
            dimension: self.config.dimension,
            embedding_provider: self.embedder.provider_type(),
            repository,
            ledger: self.ledger.stats(),
        })
    }

    async fn store(&self, id: Uuid, input: NewDocument) -> DocumentResult<IngestReceipt> {
        let vector = self.embed(&input.content).await?;

        let payload = DocumentPayload {
            content: input.content,
            metadata: input.metadata,
            ingested_at: Utc::now(),
        };
        let ledger_payload = json!({
            "content_length": payload.content.len(),
            "metadata": payload.metadata,
            "ingested_at": payload.ingested_at,
        });

        self.with_deadline("upsert", self.repository.upsert(id, vector, payload))
            .await?;

        let ledger_count = match self.ledger.increment(&id.to_string(), ledger_payload) {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(document_id = %id, error = %e, "Document stored but ledger update failed");
                None
            }
        };

        info!(document_id = %id, "Document ingested");
        Ok(IngestReceipt { id, ledger_count })
    }

    async fn embed(&self, text: &str) -> DocumentResult<Vec<f32>> {
        let vector = self.embedder.embed(text).await?;

        if vector.len() != self.config.dimension {
            error!(
                expected = self.config.dimension,
                actual = vector.len(),
                provider = %self.embedder.provider_type(),
                "Embedding provider returned a vector of the wrong length"
            );
            return Err(DocumentError::Internal(format!(
                "embedding provider returned {} dimensions, expected {}",
                vector.len(),
                self.config.dimension
            )));
        }

        Ok(vector)
    }

    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = DocumentResult<T>>,
    ) -> DocumentResult<T> {
        let deadline = self.config.repository_timeout;
        tokio::time::timeout(deadline, call)
            .await
            .unwrap_or_else(|_| {
                warn!(operation, ?deadline, "Repository call timed out");
                Err(DocumentError::RepositoryUnavailable(format!(
                    "{} timed out after {:?}",
                    operation, deadline
                )))
            })
    }
}
