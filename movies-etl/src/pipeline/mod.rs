//! Pipeline module for the movies ETL.
//!
//! A pipeline drives one change source through the shared enricher,
//! transformer and loader. Chunks are processed strictly one after another:
//!
//! ```text
//! FETCHED -> ENRICHED -> TRANSFORMED -> LOADED -> CHECKPOINTED
//! ```
//!
//! The watermark only moves after a chunk was loaded, so a failure anywhere
//! before that leaves the checkpoint where it was and the chunk is read
//! again on the next run.

use futures::TryStreamExt;
use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::enricher::MovieEnricher;
use crate::errors::EtlError;
use crate::loader::SearchLoader;
use crate::producer::ChangeSource;
use crate::transformer::MovieTransformer;
use movies_etl_shared::Chunk;

/// Last stage a chunk completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStage {
    Fetched,
    Enriched,
    Transformed,
    Loaded,
    Checkpointed,
}

impl fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetched => "fetched",
            Self::Enriched => "enriched",
            Self::Transformed => "transformed",
            Self::Loaded => "loaded",
            Self::Checkpointed => "checkpointed",
        };
        f.write_str(name)
    }
}

/// Counters for one or more pipeline runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Chunks fully processed.
    pub chunks: usize,
    /// Change records read, duplicates included.
    pub records: usize,
    /// Documents written to the search index.
    pub documents: usize,
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: Self) {
        self.chunks += other.chunks;
        self.records += other.records;
        self.documents += other.documents;
    }
}

/// One change source wired to the shared processing stages.
pub struct Pipeline {
    source: Box<dyn ChangeSource>,
    enricher: Arc<MovieEnricher>,
    transformer: MovieTransformer,
    loader: Arc<SearchLoader>,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn ChangeSource>,
        enricher: Arc<MovieEnricher>,
        transformer: MovieTransformer,
        loader: Arc<SearchLoader>,
    ) -> Self {
        Self {
            source,
            enricher,
            transformer,
            loader,
        }
    }

    /// Name of the underlying change source.
    pub fn name(&self) -> &'static str {
        self.source.name()
    }

    /// Process every pending chunk of the source.
    ///
    /// Stops at the first failing chunk and returns its error; chunks after
    /// it are left for the next run.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn run(&self) -> Result<RunSummary, EtlError> {
        let mut chunks = self.source.produce().await?;
        let mut summary = RunSummary::default();

        while let Some(chunk) = chunks.try_next().await? {
            let documents = self.process_chunk(&chunk).await?;
            summary += RunSummary {
                chunks: 1,
                records: chunk.len(),
                documents,
            };
        }

        if summary.chunks == 0 {
            debug!("No pending changes");
        } else {
            info!(
                chunks = summary.chunks,
                records = summary.records,
                documents = summary.documents,
                "Pipeline run complete"
            );
        }
        Ok(summary)
    }

    /// Run one chunk through every stage. Returns the number of documents loaded.
    async fn process_chunk(&self, chunk: &Chunk) -> Result<usize, EtlError> {
        let mut stage = ChunkStage::Fetched;
        let result = self.advance_chunk(chunk, &mut stage).await;
        if let Err(e) = &result {
            error!(
                stage = %stage,
                records = chunk.len(),
                error = %e,
                "Chunk failed, checkpoint not advanced"
            );
        }
        result
    }

    async fn advance_chunk(&self, chunk: &Chunk, stage: &mut ChunkStage) -> Result<usize, EtlError> {
        let Some(max_modified) = chunk.max_modified() else {
            return Ok(0);
        };
        let ids: Vec<Uuid> = chunk.film_work_ids().into_iter().collect();

        let aggregates = self.enricher.enrich(&ids).await?;
        *stage = ChunkStage::Enriched;

        let documents = self.transformer.transform(aggregates)?;
        *stage = ChunkStage::Transformed;

        self.loader.load(&documents).await?;
        *stage = ChunkStage::Loaded;

        self.source.set_watermark(max_modified).await?;
        *stage = ChunkStage::Checkpointed;

        debug!(
            stage = %stage,
            records = chunk.len(),
            film_works = ids.len(),
            documents = documents.len(),
            "Chunk processed"
        );
        Ok(documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_accumulates() {
        let mut total = RunSummary::default();
        total += RunSummary {
            chunks: 1,
            records: 3,
            documents: 2,
        };
        total += RunSummary {
            chunks: 2,
            records: 4,
            documents: 4,
        };

        assert_eq!(
            total,
            RunSummary {
                chunks: 3,
                records: 7,
                documents: 6
            }
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ChunkStage::Fetched.to_string(), "fetched");
        assert_eq!(ChunkStage::Checkpointed.to_string(), "checkpointed");
    }
}
