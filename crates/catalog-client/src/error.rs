//! Error types for the catalog client crate.

use releasesync_core::errors::SyncError;
use thiserror::Error;

/// Result type alias for catalog client operations.
pub type Result<T> = std::result::Result<T, CatalogClientError>;

/// Errors that can occur while talking to the catalog or events APIs.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the remote API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad configuration, malformed header value, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or unusable token)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Successful response whose body lacks a required part
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl CatalogClientError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an unexpected response error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse(message.into())
    }

    /// HTTP status if the remote answered with one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether another attempt of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Json(_)
            | Self::InvalidRequest(_)
            | Self::Auth(_)
            | Self::UnexpectedResponse(_) => false,
        }
    }

    /// Map into the sync error raised by the token exchange step.
    pub fn into_auth_error(self) -> SyncError {
        let status = self.status_code();
        SyncError::auth(self.to_string(), status)
    }

    /// Map into the sync error raised by a failed search query.
    pub fn into_fetch_error(self, query: &str) -> SyncError {
        let status = self.status_code();
        SyncError::fetch(query, self.to_string(), status)
    }
}
