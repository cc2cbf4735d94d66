//! Error types for the flow stack.

/// Structural errors raised by `FlowStack`.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FlowStackError {
    #[error("Flow stack depth limit of {limit} exceeded")]
    StackDepthExceeded { limit: usize },

    #[error("Flow stack is empty")]
    EmptyStack,
}
