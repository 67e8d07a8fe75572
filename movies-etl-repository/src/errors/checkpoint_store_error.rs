use thiserror::Error;

/// Represents errors that can occur within the checkpoint store.
#[derive(Debug, Error)]
pub enum CheckpointStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The store refused the write. Used by non-networked stores.
    #[error("Checkpoint store unavailable: {0}")]
    Unavailable(String),
}

impl CheckpointStoreError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Redis(e) => {
                e.is_io_error() || e.is_connection_dropped() || e.is_timeout() || e.is_connection_refusal()
            }
            Self::Unavailable(_) => true,
        }
    }
}
