//! Change sources for the movies ETL.
//!
//! A change source watches one table of the content store for rows modified
//! after its watermark and emits the affected film works in chunks.

mod modified;
mod watermark;

pub use modified::{FilmWorkModified, GenreModified, PersonModified, SourceContext};
pub use watermark::{format_watermark, min_watermark, parse_watermark};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::errors::EtlError;
use movies_etl_shared::Chunk;

/// Lazily produced chunks of change records.
pub type ChunkStream<'a> = BoxStream<'a, Result<Chunk, EtlError>>;

/// A watched table with its own persisted watermark.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Name of the source. Also the key of its watermark in the checkpoint store.
    fn name(&self) -> &'static str;

    /// Last processed modification timestamp, or [`min_watermark`] if none.
    async fn watermark(&self) -> Result<DateTime<Utc>, EtlError>;

    /// Advance the watermark to `modified` and persist it.
    ///
    /// A value not later than the current watermark is ignored.
    async fn set_watermark(&self, modified: DateTime<Utc>) -> Result<(), EtlError>;

    /// Stream the changes newer than the current watermark, grouped into
    /// chunks. An empty backlog yields no chunks.
    async fn produce(&self) -> Result<ChunkStream<'_>, EtlError>;
}
