//! Error types for recordstore
//!
//! Provides a unified error type for all store operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Boxed cause carried by serialization failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for recordstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Record Capability Errors
    // -------------------------------------------------------------------------
    #[error("Record type {type_name} is not serializable")]
    NotSerializable { type_name: &'static str },

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Record not found")]
    RecordNotFound,

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Index entry {index_key} points to missing record {primary_key}")]
    DanglingIndex {
        index_key: String,
        primary_key: String,
    },

    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[source] BoxError),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Engine error: {0}")]
    Engine(#[from] redb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// True for the `RecordNotFound` sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::RecordNotFound)
    }
}

// =============================================================================
// Engine Error Conversions
// =============================================================================

macro_rules! engine_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for StoreError {
                fn from(e: $source) -> Self {
                    StoreError::Engine(redb::Error::from(e))
                }
            }
        )*
    };
}

engine_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
