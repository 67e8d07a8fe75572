//! # Movies ETL Shared
//!
//! This crate defines the data structures shared across the movies ETL:
//! change records produced by the change sources, the denormalized film work
//! aggregate built by the enricher, and the document stored in the search index.

pub mod types;

pub use types::change::{ChangeRecord, Chunk};
pub use types::film_work::{FilmWorkAggregate, PersonCredit, PersonRole};
pub use types::movie_document::{MovieDocument, PersonRef};
