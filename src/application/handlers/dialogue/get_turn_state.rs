//! GetTurnStateHandler - Query the last checkpointed turn state

use std::sync::Arc;

use thiserror::Error;

use crate::domain::dialogue::TurnState;
use crate::domain::foundation::SessionId;
use crate::ports::{CheckpointError, CheckpointStore};

/// Query to get a session's turn state
#[derive(Debug, Clone)]
pub struct GetTurnStateQuery {
    pub session_id: SessionId,
}

/// Error type for getting turn state
#[derive(Debug, Clone, Error)]
pub enum GetTurnStateError {
    /// No checkpoint exists for the session
    #[error("No turn state for session: {0}")]
    NotFound(SessionId),

    #[error("Checkpoint error: {0}")]
    Storage(#[from] CheckpointError),
}

/// Handler for inspecting a session at its last gate boundary
pub struct GetTurnStateHandler {
    checkpoints: Arc<dyn CheckpointStore>,
}

impl GetTurnStateHandler {
    pub fn new(checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self { checkpoints }
    }

    pub async fn handle(&self, query: GetTurnStateQuery) -> Result<TurnState, GetTurnStateError> {
        self.checkpoints
            .load(query.session_id)
            .await?
            .ok_or(GetTurnStateError::NotFound(query.session_id))
    }
}
