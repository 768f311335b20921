//! Handler tests for the documents domain
//!
//! Requests go through `handlers::router` with `tower::ServiceExt::oneshot`,
//! backed by the in-memory repository and the hashing embedder.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_documents::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

const DIM: usize = 64;

async fn app() -> Router {
    let service = DocumentService::new(
        DocumentConfig::new(DIM),
        InMemoryVectorRepository::new(DIM),
        Arc::new(HashingProvider::new(DIM).unwrap()),
        Arc::new(RequestLedger::new()),
    )
    .await
    .unwrap();

    handlers::router(service)
}

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn ingest(app: &Router, content: &str) -> IngestReceipt {
    let response = app
        .clone()
        .oneshot(post_json("/", json!({ "content": content })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_ingest_returns_201_with_receipt() {
    let app = app().await;

    let response = app
        .oneshot(post_json(
            "/",
            json!({ "content": "hello world", "metadata": { "source": "test" } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt: IngestReceipt = json_body(response.into_body()).await;
    assert_eq!(receipt.ledger_count, Some(1));
}

#[tokio::test]
async fn test_ingest_empty_content_returns_422() {
    let app = app().await;

    let response = app
        .oneshot(post_json("/", json!({ "content": "  " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "EMBEDDING_ERROR");
    assert_eq!(body["code"], 422);
}

#[tokio::test]
async fn test_get_document_round_trip() {
    let app = app().await;
    let receipt = ingest(&app, "round trip content").await;

    let response = app
        .oneshot(get(&format!("/{}", receipt.id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let document: Document = json_body(response.into_body()).await;
    assert_eq!(document.id, receipt.id);
    assert_eq!(document.content, "round trip content");
    assert_eq!(document.vector.len(), DIM);
}

#[tokio::test]
async fn test_get_unknown_document_returns_404() {
    let app = app().await;

    let response = app
        .oneshot(get(&format!("/{}", uuid::Uuid::now_v7())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_search_returns_top_match() {
    let app = app().await;
    let hello = ingest(&app, "hello world").await;
    ingest(&app, "completely different words").await;

    let response = app
        .oneshot(post_json(
            "/search",
            json!({ "query": "hello world", "limit": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let result: RetrievalResult = json_body(response.into_body()).await;
    assert_eq!(result.ids(), vec![hello.id]);
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let app = app().await;

    let response = app
        .oneshot(post_json("/search", json!({ "query": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_batch_reports_each_item() {
    let app = app().await;

    let response = app
        .oneshot(post_json(
            "/batch",
            json!({
                "documents": [
                    { "content": "first" },
                    { "content": "" },
                    { "content": "third", "metadata": { "n": 3 } }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["results"][0]["status"], "ingested");
    assert_eq!(body["results"][1]["status"], "failed");
    assert_eq!(body["results"][1]["error"], "EMBEDDING_ERROR");
    assert_eq!(body["results"][2]["status"], "ingested");
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let app = app().await;

    let response = app
        .oneshot(post_json("/batch", json!({ "documents": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_returns_204_even_when_absent() {
    let app = app().await;
    let receipt = ingest(&app, "to be deleted").await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{}", receipt.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = app
        .clone()
        .oneshot(get(&format!("/ledger/{}", receipt.id)))
        .await
        .unwrap();
    let entry: LedgerEntry = json_body(response.into_body()).await;
    assert_eq!(entry.count, 1);
    assert_eq!(entry.deletions, 1);
}

#[tokio::test]
async fn test_list_with_cursor() {
    let app = app().await;
    for i in 0..3 {
        ingest(&app, &format!("listed document {i}")).await;
    }

    let response = app.clone().oneshot(get("/?limit=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first: DocumentPage = json_body(response.into_body()).await;
    assert_eq!(first.documents.len(), 2);
    let cursor = first.next_cursor.expect("more pages");

    let response = app
        .oneshot(get(&format!("/?limit=2&cursor={}", cursor)))
        .await
        .unwrap();
    let second: DocumentPage = json_body(response.into_body()).await;
    assert_eq!(second.documents.len(), 1);
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn test_list_with_bad_cursor_returns_400() {
    let app = app().await;

    let response = app.oneshot(get("/?cursor=garbage")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_with_zero_limit_returns_400() {
    let app = app().await;
    let first = ingest(&app, "still here").await;
    ingest(&app, "also here").await;

    let response = app
        .clone()
        .oneshot(get(&format!("/?limit=0&cursor={}", first.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let response = app.oneshot(get("/?limit=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_ledger_endpoints() {
    let app = app().await;
    let receipt = ingest(&app, "observed").await;

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: Value = json_body(response.into_body()).await;
    assert_eq!(health["dimension"], DIM);
    assert_eq!(health["embedding_provider"], "hashing");
    assert_eq!(health["repository"]["backend"], "memory");
    assert_eq!(health["repository"]["entry_count"], 1);
    assert_eq!(health["ledger"]["ingestions"], 1);

    let response = app
        .clone()
        .oneshot(get(&format!("/ledger/{}", receipt.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/ledger/unknown-key")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["code"], 404);
}

#[test]
fn test_openapi_lists_every_route() {
    use utoipa::OpenApi;

    let doc = DocumentApiDoc::openapi();
    let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

    for expected in ["", "/batch", "/search", "/{id}", "/health", "/ledger/{key}"] {
        assert!(paths.contains(&expected), "missing {expected}");
    }
}
