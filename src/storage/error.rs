//! Storage error types

use thiserror::Error;

/// Errors raised inside the storage layer
///
/// Only `EngineUnavailable` ever leaves a backend constructor; the other
/// variants are produced internally and reported through logs or a
/// [`LoadReport`](super::LoadReport).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The embedded database engine cannot be used in this build or runtime
    #[error("Database engine unavailable: {0}")]
    EngineUnavailable(String),

    /// File I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or parse failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database statement failure
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result alias for storage internals
pub type StorageResult<T> = std::result::Result<T, StorageError>;
