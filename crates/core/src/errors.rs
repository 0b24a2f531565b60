//! Error types shared across the synchronization crates.

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the relational store adapter.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Failures raised by the document store adapter.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// Network-level failure reaching the store.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store rejected the request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A document payload did not match the expected collection shape.
    #[error("Malformed document payload: {0}")]
    Shape(String),
}

impl DocumentStoreError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Whether re-invoking the failed call can succeed. Every write in the
    /// engine is an idempotent merge, so retrying a transient failure is safe.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => matches!(status, 408 | 409 | 423 | 425 | 429 | 500..=599),
            Self::Shape(_) => false,
        }
    }
}

/// Top-level error for synchronization operations.
///
/// No variant is fatal to the process: a failed unit of work rolls back and
/// stays pending, and callers may re-invoke safely.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a later pass can succeed without operator intervention.
    /// Pool exhaustion and transaction contention clear on their own;
    /// query and payload-shape failures do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(DatabaseError::Pool(_) | DatabaseError::Transaction(_)) => true,
            Self::Database(_) => false,
            Self::DocumentStore(error) => error.is_retryable(),
            Self::Json(_) => false,
        }
    }
}
