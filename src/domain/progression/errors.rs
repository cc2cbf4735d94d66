//! Error types for step progression.

use crate::domain::foundation::FlowName;

/// Raised when a progression call cannot settle on a step.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ProgressionError {
    #[error("Flow '{flow}' exceeded {limit} step advances in a single call")]
    MaxAdvancesExceeded { flow: FlowName, limit: u32 },
}
