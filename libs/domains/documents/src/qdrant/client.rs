use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, GetPointsBuilder,
    PointStruct, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use uuid::Uuid;

use super::QdrantConfig;
use super::convert;
use crate::error::{DocumentError, DocumentResult};
use crate::models::{
    DistanceMetric, Document, DocumentPage, DocumentPayload, RepositoryHealth, ScoredDocument,
};
use crate::repository::{VectorRepository, zero_list_limit};

/// Upper bound on points fetched while resolving a score tie at the cut
const MAX_TIE_FETCH: usize = 4096;

/// Whether `fetched`, the server's answer to a request for `requested`
/// points, holds every point scoring the same as the `limit`-th one.
fn tie_settled(fetched: &[ScoredDocument], requested: usize, limit: usize) -> bool {
    if fetched.len() < requested || fetched.len() <= limit {
        return true;
    }
    fetched[fetched.len() - 1].score < fetched[limit - 1].score
}

/// Score descending, then ingestion order, cut to `limit`.
fn rank(mut results: Vec<ScoredDocument>, limit: usize) -> Vec<ScoredDocument> {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.payload.ingested_at.cmp(&b.payload.ingested_at))
    });
    results.truncate(limit);
    results
}

/// Qdrant-backed implementation of VectorRepository
///
/// All documents live in a single collection. Listing scrolls in point-id
/// order, which for UUIDv7 ids follows ingestion order.
pub struct QdrantRepository {
    client: Qdrant,
    collection: String,
    dimension: usize,
    metric: DistanceMetric,
}

impl QdrantRepository {
    /// Connect and make sure the configured collection exists.
    pub async fn new(config: QdrantConfig) -> DocumentResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key.clone() {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder.build().map_err(|e| {
            DocumentError::RepositoryUnavailable(format!("Failed to build client: {}", e))
        })?;

        let repo = Self::from_client(client, &config);
        repo.ensure_collection().await?;
        Ok(repo)
    }

    pub fn from_client(client: Qdrant, config: &QdrantConfig) -> Self {
        Self {
            client,
            collection: config.collection.clone(),
            dimension: config.dimension,
            metric: config.metric,
        }
    }

    async fn ensure_collection(&self) -> DocumentResult<()> {
        if self.client.collection_exists(&self.collection).await? {
            tracing::debug!(collection = %self.collection, "Using existing collection");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(
                        self.dimension as u64,
                        convert::to_distance(self.metric),
                    ),
                ),
            )
            .await?;

        tracing::info!(
            collection = %self.collection,
            dimension = self.dimension,
            metric = %self.metric,
            "Created collection"
        );
        Ok(())
    }

    /// Vector size and metric as recorded by the server
    async fn collection_params(&self) -> DocumentResult<(usize, DistanceMetric)> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await?
            .result
            .ok_or_else(|| {
                DocumentError::RepositoryUnavailable(format!(
                    "Collection '{}' info missing",
                    self.collection
                ))
            })?;

        let params = info
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|vc| vc.config);

        match params {
            Some(qdrant::vectors_config::Config::Params(p)) => {
                Ok((p.size as usize, convert::from_distance(p.distance())?))
            }
            Some(qdrant::vectors_config::Config::ParamsMap(map)) => match map.map.values().next() {
                Some(p) => Ok((p.size as usize, convert::from_distance(p.distance())?)),
                None => Ok((self.dimension, self.metric)),
            },
            None => Ok((self.dimension, self.metric)),
        }
    }

    async fn search_points(
        &self,
        query: &[f32],
        limit: usize,
    ) -> DocumentResult<Vec<ScoredDocument>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await?;

        response
            .result
            .into_iter()
            .map(|point| {
                Ok(ScoredDocument {
                    id: convert::point_uuid(point.id.as_ref())?,
                    score: point.score,
                    payload: convert::payload_from_qdrant(point.payload)?,
                })
            })
            .collect()
    }

    fn to_document(point: qdrant::RetrievedPoint) -> DocumentResult<Document> {
        let id = convert::point_uuid(point.id.as_ref())?;
        let vector = convert::dense_vector(point.vectors).unwrap_or_default();
        let payload = convert::payload_from_qdrant(point.payload)?;
        Ok(Document::from_parts(id, vector, payload))
    }
}

#[async_trait]
impl VectorRepository for QdrantRepository {
    async fn upsert(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        payload: DocumentPayload,
    ) -> DocumentResult<()> {
        if vector.len() != self.dimension {
            return Err(DocumentError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let point = PointStruct::new(
            convert::point_id(id),
            vector,
            convert::payload_to_qdrant(payload),
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await?;

        Ok(())
    }

    async fn search(&self, query: Vec<f32>, limit: usize) -> DocumentResult<Vec<ScoredDocument>> {
        if limit == 0 {
            return Ok(vec![]);
        }

        // Widen the request until the tie group at the cut is complete.
        let mut requested = limit.saturating_add(1);
        loop {
            let fetched = self.search_points(&query, requested).await?;
            let settled = tie_settled(&fetched, requested, limit);

            if settled || requested >= MAX_TIE_FETCH {
                if !settled {
                    tracing::warn!(
                        limit,
                        fetched = fetched.len(),
                        "Score tie at the cut exceeds the fetch cap; tie order may be partial"
                    );
                }
                return Ok(rank(fetched, limit));
            }

            requested = requested.saturating_mul(2).min(MAX_TIE_FETCH);
        }
    }

    async fn list(&self, limit: usize, cursor: Option<String>) -> DocumentResult<DocumentPage> {
        if limit == 0 {
            return Err(zero_list_limit());
        }

        let mut builder = ScrollPointsBuilder::new(&self.collection)
            .limit(limit as u32)
            .with_payload(true)
            .with_vectors(true);

        if let Some(cursor) = cursor.as_deref() {
            builder = builder.offset(convert::point_from_cursor(cursor)?);
        }

        let response = self.client.scroll(builder).await?;

        let documents = response
            .result
            .into_iter()
            .map(Self::to_document)
            .collect::<DocumentResult<Vec<_>>>()?;

        Ok(DocumentPage {
            documents,
            next_cursor: response
                .next_page_offset
                .as_ref()
                .and_then(convert::cursor_from_point),
        })
    }

    async fn get(&self, id: Uuid) -> DocumentResult<Option<Document>> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, vec![convert::point_id(id)])
                    .with_payload(true)
                    .with_vectors(true),
            )
            .await?;

        response
            .result
            .into_iter()
            .next()
            .map(Self::to_document)
            .transpose()
    }

    /// Looks the point up before deleting it, since Qdrant does not report
    /// whether a delete removed anything. The two calls are not atomic:
    /// concurrent deletes of one id can each return `true`.
    async fn delete(&self, id: Uuid) -> DocumentResult<bool> {
        let existing = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, vec![convert::point_id(id)])
                    .with_payload(false)
                    .with_vectors(false),
            )
            .await?;

        if existing.result.is_empty() {
            return Ok(false);
        }

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(vec![convert::point_id(id)])
                    .wait(true),
            )
            .await?;

        Ok(true)
    }

    async fn health_check(&self) -> DocumentResult<RepositoryHealth> {
        let (dimension, metric) = self.collection_params().await?;

        let entry_count = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await?
            .result
            .map(|r| r.count)
            .unwrap_or_default();

        Ok(RepositoryHealth {
            backend: format!("qdrant:{}", self.collection),
            dimension,
            metric,
            entry_count,
        })
    }
}
