//! PostgreSQL implementation of the content repository.
//!
//! Reads the `content` schema maintained by the admin application.

mod content_repository;
mod queries;

pub use content_repository::PostgresContentRepository;
