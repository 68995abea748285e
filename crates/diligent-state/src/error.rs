//! Error types for diligent-state

use thiserror::Error;

/// Errors raised while opening or preparing the store.
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection or authentication error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors returned by [`crate::storage_traits::ReportLog`] operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No log record with the given id.
    #[error("log record not found: {id}")]
    RecordNotFound { id: String },

    /// A stored digest is not 64 hex characters.
    #[error("invalid content digest: {digest}")]
    InvalidDigest { digest: String },

    /// Backend failure (query, connection, decoding).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}
