//! This module defines the core data structures used across the movies ETL.
//! It re-exports the change, aggregate and document types.

pub mod change;
pub mod film_work;
pub mod movie_document;

pub use change::{ChangeRecord, Chunk};
pub use film_work::{FilmWorkAggregate, PersonCredit, PersonRole};
pub use movie_document::{MovieDocument, PersonRef};
