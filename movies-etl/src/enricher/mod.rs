//! Enricher module for the movies ETL.
//!
//! Loads the full aggregate (persons and genres) for the film works named by
//! a chunk.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::EtlError;
use crate::retry::{retry, RetryPolicy};
use movies_etl_repository::ContentRepository;
use movies_etl_shared::FilmWorkAggregate;

/// Loads film work aggregates from the content store.
pub struct MovieEnricher {
    repository: Arc<dyn ContentRepository>,
    retry_policy: RetryPolicy,
}

impl MovieEnricher {
    pub fn new(repository: Arc<dyn ContentRepository>, retry_policy: RetryPolicy) -> Self {
        Self {
            repository,
            retry_policy,
        }
    }

    /// Load one aggregate per distinct id in a single query.
    ///
    /// Duplicate ids are collapsed before querying; ids that no longer exist
    /// are skipped. An empty input returns without touching the store.
    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    pub async fn enrich(&self, ids: &[Uuid]) -> Result<Vec<FilmWorkAggregate>, EtlError> {
        let distinct: Vec<Uuid> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let aggregates = {
            let repository = &self.repository;
            let distinct = &distinct;
            retry(&self.retry_policy, "enrich film works", || async move {
                repository
                    .film_works_by_ids(distinct)
                    .await
                    .map_err(EtlError::from)
            })
            .await?
        };

        let mut seen = HashSet::with_capacity(aggregates.len());
        let aggregates: Vec<FilmWorkAggregate> = aggregates
            .into_iter()
            .filter(|aggregate| seen.insert(aggregate.id))
            .collect();

        debug!(
            requested = distinct.len(),
            found = aggregates.len(),
            "Enriched film works"
        );
        Ok(aggregates)
    }
}
