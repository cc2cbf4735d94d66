//! Checkpoint Store Port - persistence of `TurnState` at the gate.
//!
//! Called once per suspension. Each call must be atomic: a reader sees the
//! previous checkpoint or the new one, never a mix.

use async_trait::async_trait;

use crate::domain::dialogue::TurnState;
use crate::domain::foundation::SessionId;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, session_id: SessionId, state: &TurnState) -> Result<(), CheckpointError>;

    /// Last checkpoint, `Ok(None)` for a new session.
    async fn load(&self, session_id: SessionId) -> Result<Option<TurnState>, CheckpointError>;

    async fn delete(&self, session_id: SessionId) -> Result<(), CheckpointError>;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CheckpointError {
    #[error("checkpoint storage error: {0}")]
    Storage(String),

    #[error("checkpoint serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Storage(err.to_string())
    }
}

impl From<serde_yaml::Error> for CheckpointError {
    fn from(err: serde_yaml::Error) -> Self {
        CheckpointError::Serialization(err.to_string())
    }
}
