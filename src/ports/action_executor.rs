//! Action Executor Port - runs the business logic behind `Action` steps.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::flow::SlotValue;
use crate::domain::foundation::SlotName;

/// Inputs and outputs of an action call, keyed by parameter name.
pub type ActionPayload = BTreeMap<String, SlotValue>;

/// Port for action execution. Only invoked while the conversation is in
/// `ExecutingAction`.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, call: &str, inputs: &ActionPayload) -> Result<ActionPayload, ActionError>;
}

/// Errors from action calls.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ActionError {
    /// The action failed. Retryable failures are attempted again by the
    /// orchestrator up to its retry limit.
    #[error("action failed: {reason}")]
    Failed { reason: String, retryable: bool },

    /// The action refused its input. When `slot` names the offending slot the
    /// user is asked for it again.
    #[error("action rejected input: {reason}")]
    Rejected { slot: Option<SlotName>, reason: String },

    #[error("action timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl ActionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ActionError::Failed { retryable, .. } => *retryable,
            ActionError::Timeout { .. } => true,
            ActionError::Rejected { .. } => false,
        }
    }
}
