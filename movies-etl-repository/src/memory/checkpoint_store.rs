use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::CheckpointStoreError;
use crate::interfaces::CheckpointStore;

/// Checkpoint store kept in process memory.
///
/// Writes can be made to fail on demand with [`fail_persist`](Self::fail_persist),
/// which is how tests exercise checkpoint persistence failures.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    state: Mutex<HashMap<String, String>>,
    fail_persist: AtomicBool,
    persist_calls: AtomicUsize,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `state`.
    pub fn with_state(state: HashMap<String, String>) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    /// Make subsequent `persist` calls fail (or succeed again).
    pub fn fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    /// Number of `persist` calls so far, failed ones included.
    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    /// Copy of the currently stored mapping.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn retrieve_all(&self) -> Result<HashMap<String, String>, CheckpointStoreError> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| CheckpointStoreError::Unavailable("state lock poisoned".to_string()))
    }

    async fn persist(&self, state: &HashMap<String, String>) -> Result<(), CheckpointStoreError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(CheckpointStoreError::Unavailable(
                "persist disabled".to_string(),
            ));
        }

        let mut stored = self
            .state
            .lock()
            .map_err(|_| CheckpointStoreError::Unavailable("state lock poisoned".to_string()))?;
        *stored = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_replaces_whole_mapping() {
        let store = InMemoryCheckpointStore::with_state(HashMap::from([
            ("PersonModified".to_string(), "a".to_string()),
            ("GenreModified".to_string(), "b".to_string()),
        ]));

        let next = HashMap::from([("FilmWorkModified".to_string(), "c".to_string())]);
        store.persist(&next).await.unwrap();

        assert_eq!(store.retrieve_all().await.unwrap(), next);
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_previous_state() {
        let initial = HashMap::from([("PersonModified".to_string(), "a".to_string())]);
        let store = InMemoryCheckpointStore::with_state(initial.clone());
        store.fail_persist(true);

        let result = store
            .persist(&HashMap::from([(
                "PersonModified".to_string(),
                "b".to_string(),
            )]))
            .await;

        assert!(result.is_err());
        assert_eq!(store.snapshot(), initial);
        assert_eq!(store.persist_calls(), 1);
    }
}
