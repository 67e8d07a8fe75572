//! # Movies ETL
//!
//! Incremental ETL that keeps the movies search index in sync with the
//! PostgreSQL content store.
//!
//! ## Architecture
//!
//! Each watched table gets its own pipeline:
//!
//! 1. **Producer**: Streams film works changed since the source's watermark
//! 2. **Enricher**: Loads persons and genres for a chunk of film works
//! 3. **Transformer**: Builds search documents from the aggregates
//! 4. **Loader**: Bulk upserts the documents into OpenSearch
//! 5. **Runner**: Polls every pipeline until shutdown
//!
//! The watermark of a source only advances after its chunk was loaded.
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`producer`]: Change sources and watermarks
//! - [`state`]: Checkpoint tracker
//! - [`enricher`]: Loads film work aggregates
//! - [`transformer`]: Aggregates to documents
//! - [`loader`]: Writes documents to the search index
//! - [`pipeline`]: Per-source chunk processing
//! - [`runner`]: Polling loop
//! - [`retry`]: Exponential backoff
//! - [`errors`]: Error types for the ETL

pub mod config;
pub mod enricher;
pub mod errors;
pub mod loader;
pub mod pipeline;
pub mod producer;
pub mod retry;
pub mod runner;
pub mod state;
pub mod transformer;

pub use config::{Dependencies, Settings};
pub use errors::EtlError;

use thiserror::Error;

/// Errors that can occur during ETL initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// ETL error.
    #[error("ETL error: {0}")]
    EtlError(#[from] EtlError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
