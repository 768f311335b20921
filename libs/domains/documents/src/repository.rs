use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DocumentError, DocumentResult};
use crate::models::{
    DistanceMetric, Document, DocumentPage, DocumentPayload, RepositoryHealth, ScoredDocument,
};

/// Repository trait for vector storage operations
///
/// Implementations own their internal concurrency control. Concurrent writes
/// to the same id resolve last-write-wins in completion order. Every method
/// may suspend on I/O.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Insert or replace the entry for `id`. Idempotent.
    async fn upsert(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        payload: DocumentPayload,
    ) -> DocumentResult<()>;

    /// Up to `limit` entries ranked by descending score, ties broken by
    /// insertion order. Empty store yields an empty vec.
    async fn search(&self, query: Vec<f32>, limit: usize) -> DocumentResult<Vec<ScoredDocument>>;

    /// One page of stored entries in a stable store-defined order.
    ///
    /// `next_cursor` is `None` only on the last page. A zero `limit` is a
    /// `Validation` error.
    async fn list(&self, limit: usize, cursor: Option<String>) -> DocumentResult<DocumentPage>;

    /// Get a single entry by id
    async fn get(&self, id: Uuid) -> DocumentResult<Option<Document>>;

    /// Remove the entry for `id`; returns whether anything was removed.
    ///
    /// Stores that cannot delete and report in one step may answer `true`
    /// to more than one of several concurrent deletes of the same id.
    async fn delete(&self, id: Uuid) -> DocumentResult<bool>;

    /// Store metadata, or `RepositoryUnavailable` if the store is unreachable
    async fn health_check(&self) -> DocumentResult<RepositoryHealth>;
}

#[async_trait]
impl<T: VectorRepository + ?Sized> VectorRepository for Arc<T> {
    async fn upsert(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        payload: DocumentPayload,
    ) -> DocumentResult<()> {
        (**self).upsert(id, vector, payload).await
    }

    async fn search(&self, query: Vec<f32>, limit: usize) -> DocumentResult<Vec<ScoredDocument>> {
        (**self).search(query, limit).await
    }

    async fn list(&self, limit: usize, cursor: Option<String>) -> DocumentResult<DocumentPage> {
        (**self).list(limit, cursor).await
    }

    async fn get(&self, id: Uuid) -> DocumentResult<Option<Document>> {
        (**self).get(id).await
    }

    async fn delete(&self, id: Uuid) -> DocumentResult<bool> {
        (**self).delete(id).await
    }

    async fn health_check(&self) -> DocumentResult<RepositoryHealth> {
        (**self).health_check().await
    }
}

pub(crate) fn zero_list_limit() -> DocumentError {
    DocumentError::Validation("list limit must be greater than zero".to_string())
}

#[derive(Debug, Clone)]
struct StoredEntry {
    seq: u64,
    vector: Vec<f32>,
    payload: DocumentPayload,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<Uuid, StoredEntry>,
    /// Insertion order; an overwrite keeps the original sequence number
    order: BTreeMap<u64, Uuid>,
    next_seq: u64,
}

/// In-memory implementation of VectorRepository (for development/testing)
///
/// Search is an exact scan over every stored vector. The list cursor is the
/// insertion sequence number of the last entry returned.
#[derive(Debug, Clone)]
pub struct InMemoryVectorRepository {
    store: Arc<RwLock<Store>>,
    dimension: usize,
    metric: DistanceMetric,
}

impl InMemoryVectorRepository {
    pub fn new(dimension: usize) -> Self {
        Self::with_metric(dimension, DistanceMetric::default())
    }

    pub fn with_metric(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            dimension,
            metric,
        }
    }

    fn check_dimension(&self, actual: usize) -> DocumentResult<()> {
        if actual != self.dimension {
            return Err(DocumentError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }

    fn parse_cursor(cursor: &str) -> DocumentResult<u64> {
        cursor
            .parse()
            .map_err(|_| DocumentError::Validation(format!("Invalid cursor: {}", cursor)))
    }
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn upsert(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        payload: DocumentPayload,
    ) -> DocumentResult<()> {
        self.check_dimension(vector.len())?;

        let mut store = self.store.write().await;

        if let Some(existing) = store.entries.get_mut(&id) {
            existing.vector = vector;
            existing.payload = payload;
            tracing::debug!(document_id = %id, "Replaced vector");
            return Ok(());
        }

        let seq = store.next_seq;
        store.next_seq += 1;
        store.order.insert(seq, id);
        store.entries.insert(
            id,
            StoredEntry {
                seq,
                vector,
                payload,
            },
        );

        tracing::debug!(document_id = %id, seq, "Stored vector");
        Ok(())
    }

    async fn search(&self, query: Vec<f32>, limit: usize) -> DocumentResult<Vec<ScoredDocument>> {
        self.check_dimension(query.len())?;

        let store = self.store.read().await;

        let mut scored: Vec<(f32, u64, Uuid, &StoredEntry)> = store
            .entries
            .iter()
            .map(|(id, entry)| (self.metric.score(&query, &entry.vector), entry.seq, *id, entry))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, _, id, entry)| ScoredDocument {
                id,
                score,
                payload: entry.payload.clone(),
            })
            .collect())
    }

    async fn list(&self, limit: usize, cursor: Option<String>) -> DocumentResult<DocumentPage> {
        if limit == 0 {
            return Err(zero_list_limit());
        }

        let start = match cursor.as_deref() {
            Some(cursor) => Bound::Excluded(Self::parse_cursor(cursor)?),
            None => Bound::Unbounded,
        };

        let store = self.store.read().await;

        let mut page = store.order.range((start, Bound::Unbounded));
        let mut documents = Vec::with_capacity(limit.min(store.entries.len()));
        let mut last_seq = None;

        for (seq, id) in page.by_ref().take(limit) {
            if let Some(entry) = store.entries.get(id) {
                documents.push(Document::from_parts(
                    *id,
                    entry.vector.clone(),
                    entry.payload.clone(),
                ));
                last_seq = Some(*seq);
            }
        }

        let next_cursor = match (last_seq, page.next()) {
            (Some(seq), Some(_)) => Some(seq.to_string()),
            _ => None,
        };

        Ok(DocumentPage {
            documents,
            next_cursor,
        })
    }

    async fn get(&self, id: Uuid) -> DocumentResult<Option<Document>> {
        let store = self.store.read().await;
        Ok(store
            .entries
            .get(&id)
            .map(|entry| Document::from_parts(id, entry.vector.clone(), entry.payload.clone())))
    }

    async fn delete(&self, id: Uuid) -> DocumentResult<bool> {
        let mut store = self.store.write().await;

        match store.entries.remove(&id) {
            Some(entry) => {
                store.order.remove(&entry.seq);
                tracing::debug!(document_id = %id, "Deleted vector");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> DocumentResult<RepositoryHealth> {
        let store = self.store.read().await;
        Ok(RepositoryHealth {
            backend: "memory".to_string(),
            dimension: self.dimension,
            metric: self.metric,
            entry_count: store.entries.len() as u64,
        })
    }
}
