//! In-memory view of the persisted checkpoints.
//!
//! The tracker loads the whole mapping once at startup and writes it back in
//! full on every change. The in-memory copy is only updated after the store
//! accepted the new mapping, so a failed persist leaves both sides unchanged.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::EtlError;
use crate::retry::{retry, RetryPolicy};
use movies_etl_repository::CheckpointStore;

/// Cached checkpoint mapping backed by a [`CheckpointStore`].
pub struct CheckpointTracker {
    store: Arc<dyn CheckpointStore>,
    state: Mutex<HashMap<String, String>>,
    retry_policy: RetryPolicy,
}

impl CheckpointTracker {
    /// Read the full mapping from `store`.
    ///
    /// Transient store errors are retried according to `retry_policy`.
    pub async fn load(
        store: Arc<dyn CheckpointStore>,
        retry_policy: RetryPolicy,
    ) -> Result<Self, EtlError> {
        let state = {
            let store = &store;
            retry(&retry_policy, "retrieve checkpoints", || async move {
                store.retrieve_all().await.map_err(EtlError::from)
            })
            .await?
        };

        info!(checkpoints = state.len(), "Loaded checkpoints");

        Ok(Self {
            store,
            state: Mutex::new(state),
            retry_policy,
        })
    }

    /// Current value for `key`, if any was ever stored.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.state.lock().await.get(key).cloned()
    }

    /// Store `value` under `key` and persist the whole mapping.
    ///
    /// The lock is held across the persist so concurrent writers cannot
    /// interleave their whole-map writes.
    pub async fn set(&self, key: &str, value: String) -> Result<(), EtlError> {
        let mut state = self.state.lock().await;

        let mut candidate = state.clone();
        candidate.insert(key.to_string(), value);

        {
            let store = &self.store;
            let candidate = &candidate;
            retry(&self.retry_policy, "persist checkpoints", || async move {
                store.persist(candidate).await.map_err(EtlError::from)
            })
            .await?;
        }

        debug!(key = %key, value = ?candidate.get(key), "Checkpoint persisted");
        *state = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movies_etl_repository::InMemoryCheckpointStore;

    #[tokio::test]
    async fn test_load_existing_state() {
        let store = Arc::new(InMemoryCheckpointStore::with_state(HashMap::from([(
            "PersonModified".to_string(),
            "2024-01-01T00:00:00.000000Z".to_string(),
        )])));

        let tracker = CheckpointTracker::load(store, RetryPolicy::no_retry())
            .await
            .unwrap();

        assert_eq!(
            tracker.get("PersonModified").await.as_deref(),
            Some("2024-01-01T00:00:00.000000Z")
        );
        assert_eq!(tracker.get("GenreModified").await, None);
    }

    #[tokio::test]
    async fn test_set_persists_whole_mapping() {
        let store = Arc::new(InMemoryCheckpointStore::with_state(HashMap::from([(
            "GenreModified".to_string(),
            "a".to_string(),
        )])));
        let tracker = CheckpointTracker::load(store.clone(), RetryPolicy::no_retry())
            .await
            .unwrap();

        tracker.set("PersonModified", "b".to_string()).await.unwrap();

        let persisted = store.snapshot();
        assert_eq!(persisted.get("GenreModified").map(String::as_str), Some("a"));
        assert_eq!(persisted.get("PersonModified").map(String::as_str), Some("b"));
        assert_eq!(store.persist_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_memory_unchanged() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let tracker = CheckpointTracker::load(store.clone(), RetryPolicy::no_retry())
            .await
            .unwrap();
        store.fail_persist(true);

        let result = tracker.set("FilmWorkModified", "x".to_string()).await;

        assert!(matches!(result, Err(EtlError::CheckpointStore(_))));
        assert_eq!(tracker.get("FilmWorkModified").await, None);
        assert!(store.snapshot().is_empty());
    }
}
