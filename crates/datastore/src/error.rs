//! Store error types

use thiserror::Error;

/// Data store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sled database error
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Corruption detected in persisted data
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// A data migration failed while opening the store
    #[error("Migration failed: {0}")]
    Migration(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The store is no longer available
    #[error("Data store closed")]
    Closed,
}

impl StoreError {
    /// Whether this error belongs to the expected, recoverable I/O class
    ///
    /// Reads fall back to defaults on transient errors. Everything else is a
    /// programming or configuration error and is surfaced to the caller.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Io(_) | StoreError::Corruption(_) | StoreError::Serialization(_) => true,
            StoreError::Sled(sled::Error::Io(_)) => true,
            StoreError::Sled(_) | StoreError::Migration(_) | StoreError::Closed => false,
        }
    }

    /// Wrap a migration failure
    pub fn migration(err: anyhow::Error) -> Self {
        StoreError::Migration(err.into())
    }
}

/// Result type for data store operations
pub type Result<T> = std::result::Result<T, StoreError>;
