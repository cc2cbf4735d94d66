//! Ceilings that keep every turn bounded.

use std::time::Duration;

use crate::domain::flow::DEFAULT_MAX_STACK_DEPTH;
use crate::domain::progression::DEFAULT_MAX_ADVANCES;

/// Limits applied by the handlers and the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineLimits {
    pub max_stack_depth: usize,
    /// Cursor moves per progression call.
    pub max_advances: u32,
    /// Unclear confirmation answers before the turn fails.
    pub max_confirmation_retries: u8,
    pub max_digression_depth: u8,
    /// Action steps executed in one turn before suspending.
    pub max_chained_actions: u32,
    /// Extra attempts for a retryable action failure.
    pub max_action_retries: u32,
    /// Internal loop iterations per turn.
    pub max_turn_iterations: u32,
    pub classifier_timeout: Duration,
    pub action_timeout: Duration,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            max_advances: DEFAULT_MAX_ADVANCES,
            max_confirmation_retries: 3,
            max_digression_depth: 3,
            max_chained_actions: 8,
            max_action_retries: 2,
            max_turn_iterations: 128,
            classifier_timeout: Duration::from_secs(5),
            action_timeout: Duration::from_secs(10),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn timeout_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
