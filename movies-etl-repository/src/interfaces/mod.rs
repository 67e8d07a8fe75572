//! Interface definitions for the external systems the ETL talks to.
//!
//! These traits allow dependency injection and swappable backends: the
//! pipeline only depends on the traits, tests plug in in-memory doubles.

mod checkpoint_store;
mod content_repository;
mod search_index_provider;

pub use checkpoint_store::CheckpointStore;
pub use content_repository::{ChangeStream, ContentRepository};
pub use search_index_provider::SearchIndexProvider;
