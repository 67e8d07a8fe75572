//! In-memory implementations of the repository interfaces.
//!
//! Used for tests and dry runs where no external system is available.

mod checkpoint_store;

pub use checkpoint_store::InMemoryCheckpointStore;
