//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::BulkUpsertSummary;
use movies_etl_shared::MovieDocument;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the loader to enable easy testing with
/// mock implementations.
///
/// # Note on Document Writes
///
/// There is no separate create or partial update. Every write is a full
/// document replace keyed by the film work id, so writing the same document
/// twice leaves the index unchanged.
///
/// # Index Initialization
///
/// Implementations should call `ensure_index_exists` during application startup to ensure
/// the search index and any aliases are properly configured before performing document operations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the search index and any required aliases exist, creating them if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If initialization fails
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Upsert documents in a single bulk request.
    ///
    /// The batch succeeds or fails as a whole: if any item is rejected the
    /// call returns `SearchIndexError::PartialBulkFailure`, and callers must
    /// treat the whole batch as not loaded.
    ///
    /// # Arguments
    ///
    /// * `documents` - Documents to write, keyed by their `id`
    ///
    /// # Returns
    ///
    /// * `Ok(BulkUpsertSummary)` - Every document was written
    /// * `Err(SearchIndexError)` - The request failed or any item failed
    async fn bulk_upsert_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BulkUpsertSummary, SearchIndexError>;
}
