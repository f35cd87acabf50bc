//! Error types shared by the release sync domain.

use thiserror::Error;

use crate::sync::{classify_http_status, SyncRetryClass};

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for core services and repository contracts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Storage-level failures surfaced through repository traits.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of a catalog synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Token exchange failed or the response carried no token. Aborts the run.
    #[error("Authentication failed: {message}")]
    Auth {
        message: String,
        status: Option<u16>,
    },

    /// A search query could not be fetched.
    #[error("Fetch failed for query '{query}': {message}")]
    Fetch {
        query: String,
        message: String,
        status: Option<u16>,
    },

    /// Cover image could not be downloaded or stored.
    #[error("Image attach failed for {url}: {message}")]
    ImageAttach { url: String, message: String },

    /// A remote item lacks a required field.
    #[error("Malformed catalog item: {reason}")]
    MalformedItem { reason: String },

    /// Another run holds the sync lock.
    #[error("A release sync run is already in progress")]
    AlreadyRunning,

    #[error("Sync not configured: {0}")]
    NotConfigured(String),
}

impl SyncError {
    pub fn auth(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Auth {
            message: message.into(),
            status,
        }
    }

    pub fn fetch(query: impl Into<String>, message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Fetch {
            query: query.into(),
            message: message.into(),
            status,
        }
    }

    pub fn image_attach(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageAttach {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedItem {
            reason: reason.into(),
        }
    }

    /// Classify the failure for the scheduler's retry policy.
    ///
    /// Transport failures without an HTTP status are retryable.
    pub fn retry_class(&self) -> SyncRetryClass {
        match self {
            Self::Auth { status, .. } | Self::Fetch { status, .. } => match status {
                Some(code) => classify_http_status(*code),
                None => SyncRetryClass::Retryable,
            },
            Self::ImageAttach { .. } | Self::AlreadyRunning => SyncRetryClass::Retryable,
            Self::MalformedItem { .. } | Self::NotConfigured(_) => SyncRetryClass::Permanent,
        }
    }
}
