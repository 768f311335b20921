use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_config::ConfigError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("No ledger entry for '{0}'")]
    LedgerEntryNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised by the request ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Ledger counter overflow for key '{0}'")]
    CounterOverflow(String),
}

impl DocumentError {
    /// Stable machine-readable identifier used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::Embedding(_) => "EMBEDDING_ERROR",
            DocumentError::RepositoryUnavailable(_) => "REPOSITORY_UNAVAILABLE",
            DocumentError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            DocumentError::NotFound(_) | DocumentError::LedgerEntryNotFound(_) => "NOT_FOUND",
            DocumentError::Validation(_) => "VALIDATION_ERROR",
            DocumentError::Config(_) => "CONFIG_ERROR",
            DocumentError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DocumentError::Embedding(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DocumentError::Validation(_) => StatusCode::BAD_REQUEST,
            DocumentError::NotFound(_) | DocumentError::LedgerEntryNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DocumentError::RepositoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DocumentError::DimensionMismatch { .. }
            | DocumentError::Config(_)
            | DocumentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ConfigError> for DocumentError {
    fn from(err: ConfigError) -> Self {
        DocumentError::Config(err.to_string())
    }
}

impl From<qdrant_client::QdrantError> for DocumentError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        DocumentError::RepositoryUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for DocumentError {
    fn from(err: reqwest::Error) -> Self {
        DocumentError::Embedding(err.to_string())
    }
}

impl From<validator::ValidationErrors> for DocumentError {
    fn from(err: validator::ValidationErrors) -> Self {
        DocumentError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::Internal(format!("JSON error: {}", err))
    }
}

/// Error body returned by the HTTP handlers.
///
/// ```json
/// {
///   "code": 503,
///   "error": "REPOSITORY_UNAVAILABLE",
///   "message": "Vector repository unavailable: connection refused"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub error: String,
    pub message: String,
}

impl IntoResponse for DocumentError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error_kind = self.kind(), "{}", self);
        } else {
            tracing::debug!(error_kind = self.kind(), "{}", self);
        }

        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.kind().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DocumentError::NotFound(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DocumentError::LedgerEntryNotFound("key".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DocumentError::RepositoryUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DocumentError::Embedding("empty".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DocumentError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = DocumentError::DimensionMismatch {
            expected: 384,
            actual: 256,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("256"));
        assert_eq!(err.kind(), "DIMENSION_MISMATCH");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: DocumentError = ConfigError::MissingEnvVar("QDRANT_URL".into()).into();
        assert!(matches!(err, DocumentError::Config(msg) if msg.contains("QDRANT_URL")));
    }
}
