//! Error types for the movies ETL repository.
//!
//! One error type per external system: the search index, the relational
//! content store and the checkpoint store.

mod checkpoint_store_error;
mod content_repository_error;
mod search_index_error;

pub use checkpoint_store_error::CheckpointStoreError;
pub use content_repository_error::ContentRepositoryError;
pub use search_index_error::SearchIndexError;
pub(crate) use search_index_error::is_retryable_status;
