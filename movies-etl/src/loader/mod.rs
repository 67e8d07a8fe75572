//! Loader module for the movies ETL.
//!
//! Writes transformed documents into the search index in one bulk request
//! per chunk.

use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::errors::EtlError;
use crate::retry::{retry, RetryPolicy};
use movies_etl_repository::{BulkUpsertSummary, SearchIndexProvider};
use movies_etl_shared::MovieDocument;

/// Loader that indexes documents into the search engine.
///
/// Every write is a full replace keyed by the film work id, so loading the
/// same chunk twice leaves the index unchanged.
pub struct SearchLoader {
    provider: Arc<dyn SearchIndexProvider>,
    retry_policy: RetryPolicy,
}

impl SearchLoader {
    /// Create a new search loader with the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, retry_policy: RetryPolicy) -> Self {
        Self {
            provider,
            retry_policy,
        }
    }

    /// Upsert `documents` in a single bulk request.
    ///
    /// Transient failures are retried; if any document is rejected the whole
    /// batch is reported as failed.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn load(&self, documents: &[MovieDocument]) -> Result<BulkUpsertSummary, EtlError> {
        if documents.is_empty() {
            return Ok(BulkUpsertSummary::default());
        }

        let provider = &self.provider;
        let result = retry(&self.retry_policy, "bulk upsert", || async move {
            provider
                .bulk_upsert_documents(documents)
                .await
                .map_err(EtlError::from)
        })
        .await;

        match result {
            Ok(summary) => {
                debug!(
                    total = summary.total,
                    created = summary.created,
                    updated = summary.updated,
                    "Loaded documents"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, count = documents.len(), "Failed to load documents");
                Err(e)
            }
        }
    }

    /// Make sure the index exists before the first load.
    ///
    /// Also serves as the reachability check at startup.
    pub async fn check_ready(&self) -> Result<(), EtlError> {
        self.provider.ensure_index_exists().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use movies_etl_repository::SearchIndexError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    /// Mock search provider for testing.
    struct MockSearchProvider {
        bulk_calls: AtomicUsize,
        ensure_calls: AtomicUsize,
        indexed_count: AtomicUsize,
        failures_left: AtomicUsize,
        reject_items: bool,
    }

    impl MockSearchProvider {
        fn new() -> Self {
            Self {
                bulk_calls: AtomicUsize::new(0),
                ensure_calls: AtomicUsize::new(0),
                indexed_count: AtomicUsize::new(0),
                failures_left: AtomicUsize::new(0),
                reject_items: false,
            }
        }

        fn failing(times: usize) -> Self {
            let provider = Self::new();
            provider.failures_left.store(times, Ordering::SeqCst);
            provider
        }

        fn rejecting() -> Self {
            Self {
                reject_items: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockSearchProvider {
        async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
            self.ensure_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn bulk_upsert_documents(
            &self,
            documents: &[MovieDocument],
        ) -> Result<BulkUpsertSummary, SearchIndexError> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SearchIndexError::connection("connection refused"));
            }
            if self.reject_items {
                return Err(SearchIndexError::PartialBulkFailure {
                    total: documents.len(),
                    failed: 1,
                    first_error: "mapper_parsing_exception".to_string(),
                    retryable: false,
                });
            }
            self.indexed_count.fetch_add(documents.len(), Ordering::SeqCst);
            Ok(BulkUpsertSummary {
                total: documents.len(),
                created: documents.len(),
                updated: 0,
            })
        }
    }

    fn documents(n: usize) -> Vec<MovieDocument> {
        (0..n)
            .map(|i| MovieDocument::new(Uuid::new_v4(), format!("Movie {i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_load_single_bulk_request() {
        let provider = Arc::new(MockSearchProvider::new());
        let loader = SearchLoader::new(provider.clone(), RetryPolicy::no_retry());

        let summary = loader.load(&documents(3)).await.unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(provider.bulk_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.indexed_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_load_is_noop() {
        let provider = Arc::new(MockSearchProvider::new());
        let loader = SearchLoader::new(provider.clone(), RetryPolicy::no_retry());

        loader.load(&[]).await.unwrap();

        assert_eq!(provider.bulk_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let provider = Arc::new(MockSearchProvider::failing(2));
        let loader = SearchLoader::new(provider.clone(), RetryPolicy::default());

        loader.load(&documents(2)).await.unwrap();

        assert_eq!(provider.bulk_calls.load(Ordering::SeqCst), 3);
        assert_eq!(provider.indexed_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_item_fails_batch_without_retry() {
        let provider = Arc::new(MockSearchProvider::rejecting());
        let loader = SearchLoader::new(provider.clone(), RetryPolicy::default());

        let result = tokio::time::timeout(Duration::from_secs(3600), loader.load(&documents(2)))
            .await
            .expect("a rejected document must surface instead of retrying forever");

        assert!(matches!(
            result,
            Err(EtlError::SearchIndex(SearchIndexError::PartialBulkFailure { .. }))
        ));
        assert_eq!(provider.bulk_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_ready_ensures_index() {
        let provider = Arc::new(MockSearchProvider::new());
        let loader = SearchLoader::new(provider.clone(), RetryPolicy::no_retry());

        loader.check_ready().await.unwrap();

        assert_eq!(provider.ensure_calls.load(Ordering::SeqCst), 1);
    }
}
