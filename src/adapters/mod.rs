//! Adapters - Implementations of the ports.
//!
//! - `storage` - Checkpoint stores (in-memory, YAML files)
//! - `flows` - Flow definition providers
//! - `classifier` - Scripted classifier for tests and development
//! - `actions` - Scripted action executor for tests and development

pub mod actions;
pub mod classifier;
pub mod flows;
pub mod storage;

pub use actions::MockActionExecutor;
pub use classifier::MockClassifier;
pub use flows::InMemoryFlowProvider;
pub use storage::{checkpoint_store_from_config, FileCheckpointStore, InMemoryCheckpointStore};
