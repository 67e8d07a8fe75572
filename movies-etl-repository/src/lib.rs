//! # Movies ETL Repository
//!
//! This crate provides traits and implementations for the external systems
//! the movies ETL talks to: the PostgreSQL content store it reads changes
//! from, the checkpoint store it records progress in, and the OpenSearch
//! index it writes documents to.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod postgres;
pub mod redis;
pub mod types;

pub use errors::{CheckpointStoreError, ContentRepositoryError, SearchIndexError};
pub use interfaces::{ChangeStream, CheckpointStore, ContentRepository, SearchIndexProvider};
pub use memory::InMemoryCheckpointStore;
pub use crate::opensearch::OpenSearchProvider;
pub use postgres::PostgresContentRepository;
pub use crate::redis::RedisCheckpointStore;
pub use types::{BulkUpsertSummary, ChangeFeed, ChangeOrder};
