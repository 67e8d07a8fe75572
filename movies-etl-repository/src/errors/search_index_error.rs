//! Search index error types.
//!
//! This module defines the unified error type for all search index operations.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait for all backend operations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Failed to establish connection to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Bulk indexing request could not be sent.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// The backend answered a whole request with an error status.
    #[error("Request rejected with status {status}: {message}")]
    RequestRejected { status: u16, message: String },

    /// Bulk request was accepted but some items failed.
    ///
    /// `retryable` is set only when every failed item carried a 429 or 5xx
    /// status, e.g. `es_rejected_execution_exception` under load.
    #[error("Bulk index had {failed} failed item(s) out of {total}: {first_error}")]
    PartialBulkFailure {
        total: usize,
        failed: usize,
        first_error: String,
        retryable: bool,
    },

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchIndexError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an error for a request answered with `status`.
    pub fn rejected(status: u16, msg: impl Into<String>) -> Self {
        Self::RequestRejected {
            status,
            message: msg.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures, throttling (429) and server errors (5xx) are
    /// transient. Rejected documents, other 4xx answers and unreadable
    /// responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::BulkIndexError(_) => true,
            Self::RequestRejected { status, .. } => is_retryable_status(*status),
            Self::PartialBulkFailure { retryable, .. } => *retryable,
            Self::ParseError(_) | Self::SerializationError(_) => false,
        }
    }
}

/// Statuses worth retrying: throttling and server-side failures.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}
