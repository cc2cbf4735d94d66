//! In-Memory Checkpoint Store Adapter
//!
//! Keeps the last checkpoint of each session in memory.
//! Useful for testing and single-process development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::dialogue::TurnState;
use crate::domain::foundation::SessionId;
use crate::ports::{CheckpointError, CheckpointStore};

/// In-memory checkpoint storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    states: Arc<RwLock<HashMap<SessionId, TurnState>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with a checkpoint
    pub async fn session_count(&self) -> usize {
        self.states.read().await.len()
    }

    /// Clear all checkpoints (useful for tests)
    pub async fn clear(&self) {
        self.states.write().await.clear();
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, session_id: SessionId, state: &TurnState) -> Result<(), CheckpointError> {
        self.states.write().await.insert(session_id, state.clone());
        Ok(())
    }

    async fn load(&self, session_id: SessionId) -> Result<Option<TurnState>, CheckpointError> {
        Ok(self.states.read().await.get(&session_id).cloned())
    }

    async fn delete(&self, session_id: SessionId) -> Result<(), CheckpointError> {
        self.states.write().await.remove(&session_id);
        Ok(())
    }
}
