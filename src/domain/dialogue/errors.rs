//! Engine error taxonomy.
//!
//! `ClassifiedMessage` is a closed enum matched exhaustively, so there is no
//! "unknown message variant" error to report at runtime.

use serde::{Deserialize, Serialize};

use crate::domain::flow::FlowStackError;
use crate::domain::foundation::FlowName;
use crate::domain::progression::ProgressionError;

/// Turn-fatal errors. Every one of them is recoverable at session level.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum EngineError {
    #[error("Flow stack depth limit of {limit} exceeded")]
    StackDepthExceeded { limit: usize },

    #[error("Flow stack is empty")]
    EmptyStack,

    #[error("Flow '{flow}' exceeded {limit} step advances in a single call")]
    MaxAdvancesExceeded { flow: FlowName, limit: u32 },

    #[error("Turn exceeded {limit} internal iterations")]
    TurnIterationsExceeded { limit: u32 },

    #[error("Classifier did not answer within {timeout_ms}ms")]
    ClassificationTimeout { timeout_ms: u64 },

    #[error("Action '{call}' failed: {reason}")]
    ActionFailure {
        call: String,
        reason: String,
        retryable: bool,
    },

    #[error("Confirmation still unclear after {attempts} attempts")]
    ConfirmationRetriesExhausted { attempts: u8 },

    #[error("No definition for flow '{0}'")]
    UnknownFlow(FlowName),
}

impl EngineError {
    /// Category used to pick the user-facing apology.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::StackDepthExceeded { .. } => ErrorCategory::StackDepth,
            EngineError::EmptyStack => ErrorCategory::NothingToCancel,
            EngineError::MaxAdvancesExceeded { .. } | EngineError::TurnIterationsExceeded { .. } => {
                ErrorCategory::MisconfiguredFlow
            }
            EngineError::ClassificationTimeout { .. } => ErrorCategory::ClassificationTimeout,
            EngineError::ActionFailure { .. } => ErrorCategory::ActionFailure,
            EngineError::ConfirmationRetriesExhausted { .. } => ErrorCategory::ConfirmationExhausted,
            EngineError::UnknownFlow(_) => ErrorCategory::UnknownFlow,
        }
    }

    /// Errors that point at a broken flow definition rather than a user or
    /// collaborator problem.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            EngineError::MaxAdvancesExceeded { .. }
                | EngineError::TurnIterationsExceeded { .. }
                | EngineError::UnknownFlow(_)
        )
    }
}

impl From<FlowStackError> for EngineError {
    fn from(err: FlowStackError) -> Self {
        match err {
            FlowStackError::StackDepthExceeded { limit } => EngineError::StackDepthExceeded { limit },
            FlowStackError::EmptyStack => EngineError::EmptyStack,
        }
    }
}

impl From<ProgressionError> for EngineError {
    fn from(err: ProgressionError) -> Self {
        match err {
            ProgressionError::MaxAdvancesExceeded { flow, limit } => {
                EngineError::MaxAdvancesExceeded { flow, limit }
            }
        }
    }
}

/// User-visible error categories; each maps to its own apology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    StackDepth,
    ConfirmationExhausted,
    ActionFailure,
    MisconfiguredFlow,
    ClassificationTimeout,
    NothingToCancel,
    UnknownFlow,
}
