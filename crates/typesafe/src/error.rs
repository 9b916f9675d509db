//! Preference and migration error types

use datastore::StoreError;
use thiserror::Error;

/// Preference operation errors
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// The underlying store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PreferenceError {
    /// Whether the failure is an expected store I/O failure
    pub fn is_transient(&self) -> bool {
        match self {
            PreferenceError::Store(e) => e.is_transient(),
        }
    }
}

/// Result type for preference operations
pub type Result<T> = std::result::Result<T, PreferenceError>;

/// Migration construction and execution errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A user transform rejected the stored value
    #[error("Could not migrate preference of key {current_key} to {new_key}: {source}")]
    Transform {
        /// Key the value was read from
        current_key: String,
        /// Key the value was to be written to
        new_key: String,
        /// Error raised by the transform
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
