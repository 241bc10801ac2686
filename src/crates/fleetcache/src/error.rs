//! Error types for cache operations

use thiserror::Error;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations
///
/// Ordinary misses and expired entries are not errors; read operations
/// model them as `None`/`false` returns. Errors surface only from
/// serialization, the snapshot store, and caller-supplied factories.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot store error
    #[error("Snapshot store error: {0}")]
    Store(String),

    /// Malformed or incompatible snapshot document
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure from a caller-supplied value factory
    #[error("Factory error: {0}")]
    Factory(String),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}
