//! This module defines the `ContentRepository` trait, the read-only interface
//! to the relational content store (film works, persons, genres and their link
//! tables).

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::errors::ContentRepositoryError;
use crate::types::{ChangeFeed, ChangeOrder};
use movies_etl_shared::{ChangeRecord, FilmWorkAggregate};

/// Stream of change records read incrementally from the content store.
pub type ChangeStream<'a> = BoxStream<'a, Result<ChangeRecord, ContentRepositoryError>>;

/// A trait that defines the interface for reading the content store.
#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync {
    /// Stream the film works affected by rows of `feed` modified strictly after
    /// `since`.
    ///
    /// Records are yielded in `order` of their modification timestamp and are
    /// read from the server incrementally; the full result set is never
    /// buffered. The same film work may appear more than once.
    ///
    /// # Arguments
    ///
    /// * `feed` - Which table's modifications to watch.
    /// * `since` - Exclusive lower bound on the modification timestamp.
    /// * `order` - Ordering of the stream by modification timestamp.
    fn changed_film_works(
        &self,
        feed: ChangeFeed,
        since: DateTime<Utc>,
        order: ChangeOrder,
    ) -> ChangeStream<'_>;

    /// Load the denormalized aggregates for the given film works.
    ///
    /// Identifiers that no longer exist are skipped. Result order is not
    /// related to the input order.
    ///
    /// # Arguments
    ///
    /// * `ids` - Distinct film work identifiers.
    ///
    /// # Returns
    ///
    /// At most one aggregate per identifier, or a `ContentRepositoryError` if
    /// the query fails.
    async fn film_works_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<FilmWorkAggregate>, ContentRepositoryError>;
}
