//! HTTP server initialization and lifecycle management
//!
//! - Tracing initialization
//! - Embedding provider and vector store selection
//! - Service creation and startup consistency checks
//! - axum server with graceful shutdown bounded by `SHUTDOWN_TIMEOUT_SECS`

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use domain_documents::{
    DocumentService, EmbeddingProvider, HashingProvider, InMemoryVectorRepository,
    OpenAIProvider, QdrantRepository, RequestLedger, VectorRepository,
};
use eyre::{Result, WrapErr};
use tokio::signal;
use tokio::sync::Notify;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::{Config, EmbeddingSettings, StoreSettings};
use crate::openapi::ApiDoc;

/// The service as served over HTTP; the backend is picked at startup.
pub type AppService = DocumentService<Arc<dyn VectorRepository>>;

/// Run the HTTP server
///
/// 1. Sets up structured logging (JSON for prod, pretty for dev)
/// 2. Loads configuration and builds the document service
/// 3. Serves until SIGINT/SIGTERM, then drains in-flight requests
///
/// # Errors
///
/// Returns an error if configuration is invalid, the backends disagree with
/// the configured dimension or metric, the vector store is unreachable, or
/// the listener cannot bind.
pub async fn run() -> Result<()> {
    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    core_config::tracing::init_tracing(&config.environment);

    let service = build_service(&config).await?;
    let app = build_app(service);

    let listener = tokio::net::TcpListener::bind(config.server.address())
        .await
        .wrap_err_with(|| format!("Failed to bind {}", config.server.address()))?;
    info!("Documents API listening on {}", listener.local_addr()?);

    let shutdown = Arc::new(Notify::new());
    let trigger = Arc::clone(&shutdown);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { trigger.notified().await })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            return joined
                .wrap_err("Server task panicked")?
                .wrap_err("Server encountered an error");
        }
        _ = shutdown_signal() => {}
    }

    shutdown.notify_one();
    match tokio::time::timeout(config.server.shutdown_timeout, server).await {
        Ok(joined) => joined
            .wrap_err("Server task panicked")?
            .wrap_err("Server encountered an error")?,
        Err(_) => warn!(
            timeout = ?config.server.shutdown_timeout,
            "Graceful shutdown timed out, dropping open connections"
        ),
    }

    info!("Documents API stopped");
    Ok(())
}

/// Build the document service from configuration
///
/// Connects to the configured backends and runs the startup checks of
/// `DocumentService::new`.
pub async fn build_service(config: &Config) -> Result<AppService> {
    let dimension = config.documents.dimension;

    let embedder: Arc<dyn EmbeddingProvider> = match &config.embedding {
        EmbeddingSettings::Hashing { max_input_chars } => Arc::new(
            HashingProvider::new(dimension)
                .wrap_err("Failed to create hashing embedder")?
                .with_max_input_chars(*max_input_chars),
        ),
        EmbeddingSettings::OpenAI(openai) => {
            info!(model = openai.model.model_name(), "Using OpenAI embeddings");
            Arc::new(
                OpenAIProvider::new(openai.clone())
                    .wrap_err("Failed to create OpenAI embedder")?,
            )
        }
    };

    let repository: Arc<dyn VectorRepository> = match &config.store {
        StoreSettings::Memory => {
            info!("Using in-memory vector store");
            Arc::new(InMemoryVectorRepository::with_metric(
                dimension,
                config.documents.metric,
            ))
        }
        StoreSettings::Qdrant(qdrant) => {
            info!("Connecting to Qdrant at {}...", qdrant.url);
            let repository = QdrantRepository::new(qdrant.clone())
                .await
                .wrap_err("Failed to connect to Qdrant")?;
            info!("Connected to Qdrant successfully");
            Arc::new(repository)
        }
    };

    DocumentService::new(
        config.documents.clone(),
        repository,
        embedder,
        Arc::new(RequestLedger::new()),
    )
    .await
    .wrap_err("Document service failed its startup checks")
}

/// Compose the application router
///
/// - `/api/documents/*`: document routes
/// - `/openapi.json`: OpenAPI document
/// - `/docs`: Scalar API reference
pub fn build_app(service: AppService) -> Router {
    Router::new()
        .nest("/api/documents", domain_documents::router(service))
        .route("/openapi.json", get(openapi_json))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
