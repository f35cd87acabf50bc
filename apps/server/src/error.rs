use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use releasesync_catalog_client::CatalogClientError;
use releasesync_core::errors::{DatabaseError, Error as CoreError, SyncError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A remote service the server depends on failed.
    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone()),
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_CONFIGURED",
                msg.clone(),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!("[Api] {} {}", code, message);
        }
        (status, Json(json!({ "code": code, "message": message }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ApiError::BadRequest(msg),
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::Database(DatabaseError::NotFound(msg)) => ApiError::NotFound(msg),
            CoreError::Database(DatabaseError::UniqueViolation(msg)) => ApiError::Conflict(msg),
            CoreError::Sync(sync_err) => sync_err.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match &err {
            SyncError::AlreadyRunning => ApiError::Conflict(err.to_string()),
            SyncError::NotConfigured(_) => ApiError::Unavailable(err.to_string()),
            SyncError::Auth { .. } | SyncError::Fetch { .. } | SyncError::ImageAttach { .. } => {
                ApiError::BadGateway(err.to_string())
            }
            SyncError::MalformedItem { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CatalogClientError> for ApiError {
    fn from(err: CatalogClientError) -> Self {
        ApiError::BadGateway(err.to_string())
    }
}
