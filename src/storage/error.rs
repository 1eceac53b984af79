//! Storage-specific error types.
//!
//! All registry operations return [`StorageError`] on failure, which can be
//! matched to determine the underlying cause (engine, serialization, bad row).
//! A missing record is never an error here: lookups return `Ok(None)`.

use thiserror::Error;

use crate::storage::db::DatabaseEngine;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Content could not be encoded before hashing or writing.
    #[error("marshal error: {0}")]
    Marshal(#[from] serde_json::Error),

    /// A stored payload could not be decoded back into its in-memory shape.
    #[error("unmarshal error in {field} of {record}: {source}")]
    Unmarshal {
        /// Record the payload belongs to (e.g. `component 6f1c...`).
        record: String,
        /// Column that failed to decode.
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid data in database (e.g., unknown enum value, malformed id).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// No engine was chosen before the registry was built.
    #[error("no database engine selected")]
    EngineNotSelected,

    /// The selected engine is known but has no backend.
    #[error("unsupported database engine: {0}")]
    UnsupportedEngine(DatabaseEngine),

    /// Internal error (e.g., filesystem preparation failure).
    #[error("internal error: {0}")]
    Internal(String),
}
