//! Storage Adapters
//!
//! Implementations of the CheckpointStore port for persisting turn state.
//!
//! ## Available Adapters
//!
//! - **FileCheckpointStore** - Stores turn state as YAML files on disk
//! - **InMemoryCheckpointStore** - Stores turn state in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::checkpoint_store_from_config;
//!
//! let store = checkpoint_store_from_config(&config.storage);
//! ```

mod file_checkpoint_store;
mod in_memory_checkpoint_store;

pub use file_checkpoint_store::FileCheckpointStore;
pub use in_memory_checkpoint_store::InMemoryCheckpointStore;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::ports::CheckpointStore;

/// Builds the checkpoint store selected by configuration.
pub fn checkpoint_store_from_config(config: &StorageConfig) -> Arc<dyn CheckpointStore> {
    match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryCheckpointStore::new()),
        StorageBackend::File => Arc::new(FileCheckpointStore::new(&config.path)),
    }
}
