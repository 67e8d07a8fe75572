use std::collections::HashMap;

use crate::errors::CheckpointStoreError;

/// Trait for the durable checkpoint store.
///
/// The store holds a single opaque mapping from change-source name to the
/// last processed modification timestamp. It is always read and written as a
/// whole; there is no per-key update.
#[async_trait::async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the full mapping. An empty mapping is returned when nothing was
    /// ever persisted.
    async fn retrieve_all(&self) -> Result<HashMap<String, String>, CheckpointStoreError>;

    /// Replace the stored mapping with `state`.
    async fn persist(&self, state: &HashMap<String, String>) -> Result<(), CheckpointStoreError>;
}
