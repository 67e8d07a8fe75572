//! Redis implementation of the checkpoint store.

mod checkpoint_store;

pub use checkpoint_store::{RedisCheckpointStore, DEFAULT_STATE_KEY};
