//! Change sources keyed on the `modified` column of the content tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{StreamExt, TryChunksError, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use super::watermark::{format_watermark, min_watermark, parse_watermark};
use super::{ChangeSource, ChunkStream};
use crate::errors::EtlError;
use crate::state::CheckpointTracker;
use movies_etl_repository::{ChangeFeed, ChangeOrder, ContentRepository};
use movies_etl_shared::Chunk;

/// What every change source shares: where watermarks live, where changes are
/// read from, and how they are chunked.
#[derive(Clone)]
pub struct SourceContext {
    tracker: Arc<CheckpointTracker>,
    repository: Arc<dyn ContentRepository>,
    chunk_size: usize,
    order: ChangeOrder,
}

impl SourceContext {
    /// Create a context. A `chunk_size` of zero is treated as one.
    pub fn new(
        tracker: Arc<CheckpointTracker>,
        repository: Arc<dyn ContentRepository>,
        chunk_size: usize,
        order: ChangeOrder,
    ) -> Self {
        Self {
            tracker,
            repository,
            chunk_size: chunk_size.max(1),
            order,
        }
    }

    async fn watermark(&self, key: &str) -> Result<DateTime<Utc>, EtlError> {
        match self.tracker.get(key).await {
            None => Ok(min_watermark()),
            Some(value) => parse_watermark(&value).ok_or_else(|| EtlError::InvalidCheckpoint {
                key: key.to_string(),
                value,
            }),
        }
    }

    async fn set_watermark(&self, key: &str, modified: DateTime<Utc>) -> Result<(), EtlError> {
        let current = self.watermark(key).await?;
        if modified <= current {
            debug!(
                source = key,
                current = %format_watermark(current),
                candidate = %format_watermark(modified),
                "Watermark not advanced"
            );
            return Ok(());
        }

        let value = format_watermark(modified);
        self.tracker.set(key, value.clone()).await?;
        info!(source = key, watermark = %value, "Watermark advanced");
        Ok(())
    }

    async fn produce(&self, key: &str, feed: ChangeFeed) -> Result<ChunkStream<'_>, EtlError> {
        let since = self.watermark(key).await?;
        debug!(
            source = key,
            since = %format_watermark(since),
            order = ?self.order,
            chunk_size = self.chunk_size,
            "Reading changes"
        );

        let chunks = self
            .repository
            .changed_film_works(feed, since, self.order)
            .map_err(EtlError::from)
            .try_chunks(self.chunk_size)
            .map(|batch| match batch {
                Ok(records) => Ok(Chunk::new(records)),
                Err(TryChunksError(_, e)) => Err(e),
            })
            .boxed();

        Ok(chunks)
    }
}

macro_rules! change_source {
    ($(#[$doc:meta])* $name:ident, $feed:expr) => {
        $(#[$doc])*
        pub struct $name {
            context: SourceContext,
        }

        impl $name {
            /// Key of this source's watermark in the checkpoint store.
            pub const NAME: &'static str = stringify!($name);

            pub fn new(context: SourceContext) -> Self {
                Self { context }
            }
        }

        #[async_trait]
        impl ChangeSource for $name {
            fn name(&self) -> &'static str {
                Self::NAME
            }

            async fn watermark(&self) -> Result<DateTime<Utc>, EtlError> {
                self.context.watermark(Self::NAME).await
            }

            async fn set_watermark(&self, modified: DateTime<Utc>) -> Result<(), EtlError> {
                self.context.set_watermark(Self::NAME, modified).await
            }

            async fn produce(&self) -> Result<ChunkStream<'_>, EtlError> {
                self.context.produce(Self::NAME, $feed).await
            }
        }
    };
}

change_source!(
    /// Film works whose credited persons changed.
    PersonModified,
    ChangeFeed::Person
);

change_source!(
    /// Film works whose genres changed.
    GenreModified,
    ChangeFeed::Genre
);

change_source!(
    /// Film works whose own row changed.
    FilmWorkModified,
    ChangeFeed::FilmWork
);
