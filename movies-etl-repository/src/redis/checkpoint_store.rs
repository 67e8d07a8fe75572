//! Redis-backed checkpoint store.
//!
//! Stores all checkpoints in one hash: field = change-source name,
//! value = timestamp string.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::errors::CheckpointStoreError;
use crate::interfaces::CheckpointStore;

/// Default hash key holding the checkpoint mapping.
pub const DEFAULT_STATE_KEY: &str = "etl";

/// Redis-backed checkpoint store.
///
/// Every `persist` replaces the whole hash inside a `MULTI`/`EXEC`
/// transaction, so readers never observe a partially written mapping.
pub struct RedisCheckpointStore {
    connection: ConnectionManager,
    key: String,
}

impl RedisCheckpointStore {
    /// Connects to Redis at `url` and stores checkpoints under `key`.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g. `redis://localhost:6379/0`)
    /// * `key` - Hash key holding the mapping
    pub async fn connect(url: &str, key: impl Into<String>) -> Result<Self, CheckpointStoreError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        let key = key.into();

        info!(key = %key, "Connected to checkpoint store");
        Ok(Self { connection, key })
    }
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    async fn retrieve_all(&self) -> Result<HashMap<String, String>, CheckpointStoreError> {
        let mut connection = self.connection.clone();
        let state: HashMap<String, String> = connection.hgetall(&self.key).await?;

        debug!(key = %self.key, entries = state.len(), "Retrieved checkpoints");
        Ok(state)
    }

    async fn persist(&self, state: &HashMap<String, String>) -> Result<(), CheckpointStoreError> {
        let mut connection = self.connection.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(&self.key).ignore();
        if !state.is_empty() {
            let fields: Vec<(&str, &str)> = state
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            pipe.hset_multiple(&self.key, &fields).ignore();
        }
        let _: () = pipe.query_async(&mut connection).await?;

        debug!(key = %self.key, entries = state.len(), "Persisted checkpoints");
        Ok(())
    }
}
