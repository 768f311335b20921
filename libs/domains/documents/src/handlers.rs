//! HTTP handlers for document ingestion and retrieval

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{DocumentError, DocumentResult, ErrorResponse};
use crate::ledger::{LedgerEntry, LedgerStats};
use crate::models::{
    DistanceMetric, Document, DocumentPage, DocumentPayload, EmbeddingProviderType,
    IngestReceipt, NewDocument, RepositoryHealth, RetrievalResult, ScoredDocument,
    ServiceHealth,
};
use crate::repository::VectorRepository;
use crate::service::DocumentService;

type SharedService<R> = Arc<DocumentService<R>>;

// ===== Request/Response DTOs =====

/// Request to ingest several documents
///
/// At most 1000 documents per request.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BatchIngestRequest {
    #[validate(length(min = 1, max = 1000))]
    pub documents: Vec<NewDocument>,
}

/// Outcome for one document of a batch
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItemResult {
    Ingested {
        id: Uuid,
        ledger_count: Option<u64>,
    },
    Failed {
        error: String,
        message: String,
    },
}

impl From<DocumentResult<IngestReceipt>> for BatchItemResult {
    fn from(result: DocumentResult<IngestReceipt>) -> Self {
        match result {
            Ok(receipt) => BatchItemResult::Ingested {
                id: receipt.id,
                ledger_count: receipt.ledger_count,
            },
            Err(e) => BatchItemResult::Failed {
                error: e.kind().to_string(),
                message: e.to_string(),
            },
        }
    }
}

/// Per-item batch results, in request order
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchIngestResponse {
    pub results: Vec<BatchItemResult>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Request to retrieve documents similar to a query
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    pub query: String,
    /// Defaults to the configured retrieval limit
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page size; defaults to the configured retrieval limit
    pub limit: Option<usize>,
    /// `next_cursor` from the previous page
    pub cursor: Option<String>,
}

// ===== Handlers =====

/// Ingest a document
#[utoipa::path(
    post,
    path = "",
    tag = "documents",
    request_body = NewDocument,
    responses(
        (status = 201, description = "Document ingested", body = IngestReceipt),
        (status = 422, description = "Content could not be embedded", body = ErrorResponse),
        (status = 503, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn ingest_document<R: VectorRepository>(
    State(service): State<SharedService<R>>,
    Json(input): Json<NewDocument>,
) -> DocumentResult<impl IntoResponse> {
    let receipt = service.ingest(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Ingest several documents; each one succeeds or fails independently
#[utoipa::path(
    post,
    path = "/batch",
    tag = "documents",
    request_body = BatchIngestRequest,
    responses(
        (status = 200, description = "Per-document results", body = BatchIngestResponse),
        (status = 400, description = "Empty or oversized batch", body = ErrorResponse)
    )
)]
pub async fn batch_ingest<R: VectorRepository>(
    State(service): State<SharedService<R>>,
    Json(request): Json<BatchIngestRequest>,
) -> DocumentResult<Json<BatchIngestResponse>> {
    request.validate()?;

    let results: Vec<BatchItemResult> = service
        .batch_ingest(request.documents)
        .await
        .into_iter()
        .map(BatchItemResult::from)
        .collect();

    let failed = results
        .iter()
        .filter(|r| matches!(r, BatchItemResult::Failed { .. }))
        .count();

    Ok(Json(BatchIngestResponse {
        succeeded: results.len() - failed,
        failed,
        results,
    }))
}

/// Retrieve the documents most similar to a query
#[utoipa::path(
    post,
    path = "/search",
    tag = "documents",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matches by descending score", body = RetrievalResult),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 503, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn search_documents<R: VectorRepository>(
    State(service): State<SharedService<R>>,
    Json(request): Json<SearchRequest>,
) -> DocumentResult<Json<RetrievalResult>> {
    request.validate()?;
    let result = service.retrieve(&request.query, request.limit).await?;
    Ok(Json(result))
}

/// List stored documents
#[utoipa::path(
    get,
    path = "",
    tag = "documents",
    params(ListParams),
    responses(
        (status = 200, description = "One page of documents", body = DocumentPage),
        (status = 400, description = "Malformed cursor or zero limit", body = ErrorResponse)
    )
)]
pub async fn list_documents<R: VectorRepository>(
    State(service): State<SharedService<R>>,
    Query(params): Query<ListParams>,
) -> DocumentResult<Json<DocumentPage>> {
    let page = service.list_documents(params.limit, params.cursor).await?;
    Ok(Json(page))
}

/// Get a document by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document found", body = Document),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn get_document<R: VectorRepository>(
    State(service): State<SharedService<R>>,
    Path(id): Path<Uuid>,
) -> DocumentResult<Json<Document>> {
    let document = service.get_document(id).await?;
    Ok(Json(document))
}

/// Delete a document. Deleting an absent document also succeeds.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document absent after the call"),
        (status = 503, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn delete_document<R: VectorRepository>(
    State(service): State<SharedService<R>>,
    Path(id): Path<Uuid>,
) -> DocumentResult<StatusCode> {
    service.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Repository and ledger health
#[utoipa::path(
    get,
    path = "/health",
    tag = "documents",
    responses(
        (status = 200, description = "Service healthy", body = ServiceHealth),
        (status = 503, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn health<R: VectorRepository>(
    State(service): State<SharedService<R>>,
) -> DocumentResult<Json<ServiceHealth>> {
    Ok(Json(service.health().await?))
}

/// Ledger entry for a key
#[utoipa::path(
    get,
    path = "/ledger/{key}",
    tag = "documents",
    params(("key" = String, Path, description = "Ledger key (document ID)")),
    responses(
        (status = 200, description = "Ledger entry", body = LedgerEntry),
        (status = 404, description = "Key never recorded", body = ErrorResponse)
    )
)]
pub async fn ledger_entry<R: VectorRepository>(
    State(service): State<SharedService<R>>,
    Path(key): Path<String>,
) -> DocumentResult<Json<LedgerEntry>> {
    service
        .ledger()
        .snapshot(&key)
        .map(Json)
        .ok_or(DocumentError::LedgerEntryNotFound(key))
}

/// OpenAPI documentation for the documents API
#[derive(OpenApi)]
#[openapi(
    paths(
        ingest_document,
        batch_ingest,
        search_documents,
        list_documents,
        get_document,
        delete_document,
        health,
        ledger_entry,
    ),
    components(
        schemas(
            NewDocument, IngestReceipt, BatchIngestRequest, BatchIngestResponse,
            BatchItemResult, SearchRequest, RetrievalResult, ScoredDocument,
            DocumentPayload, Document, DocumentPage, ServiceHealth, RepositoryHealth,
            DistanceMetric, EmbeddingProviderType, LedgerEntry, LedgerStats, ErrorResponse
        )
    ),
    tags(
        (name = "documents", description = "Document ingestion and similarity retrieval")
    )
)]
pub struct DocumentApiDoc;

/// Create the documents router
pub fn router<R: VectorRepository + 'static>(service: DocumentService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", post(ingest_document::<R>).get(list_documents::<R>))
        .route("/batch", post(batch_ingest::<R>))
        .route("/search", post(search_documents::<R>))
        .route("/health", get(health::<R>))
        .route("/ledger/{key}", get(ledger_entry::<R>))
        .route(
            "/{id}",
            get(get_document::<R>).delete(delete_document::<R>),
        )
        .with_state(shared_service)
}
