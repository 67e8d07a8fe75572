//! Error types for the movies ETL pipeline.

use std::time::Duration;
use thiserror::Error;

use movies_etl_repository::{CheckpointStoreError, ContentRepositoryError, SearchIndexError};

/// Errors that can occur while running a pipeline.
///
/// Each variant is either transient (retried with backoff, see
/// [`EtlError::is_transient`]) or permanent (aborts the current chunk and
/// is surfaced to the operator).
#[derive(Error, Debug)]
pub enum EtlError {
    /// Error from the relational content store.
    #[error("Content store error: {0}")]
    ContentStore(#[from] ContentRepositoryError),

    /// Error from the search index.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),

    /// Error from the checkpoint store.
    #[error("Checkpoint store error: {0}")]
    CheckpointStore(#[from] CheckpointStoreError),

    /// A stored checkpoint could not be interpreted as a timestamp.
    #[error("Invalid checkpoint for '{key}': {value:?}")]
    InvalidCheckpoint { key: String, value: String },

    /// An aggregate is missing data required to build its document.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// A call to an external system did not complete in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// Shutdown was requested while waiting to retry.
    #[error("{operation} cancelled by shutdown")]
    Cancelled { operation: String },
}

impl EtlError {
    /// Create a data integrity error.
    pub fn data_integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Whether the failed operation may succeed if retried unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ContentStore(e) => e.is_transient(),
            Self::SearchIndex(e) => e.is_transient(),
            Self::CheckpointStore(e) => e.is_transient(),
            Self::Timeout { .. } => true,
            Self::InvalidCheckpoint { .. } | Self::DataIntegrity(_) | Self::Cancelled { .. } => {
                false
            }
        }
    }
}
