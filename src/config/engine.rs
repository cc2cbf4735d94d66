//! Engine limits configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::dialogue::EngineLimits;

const MAX_TIMEOUT_MS: u64 = 600_000;

/// Ceilings applied to every turn
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Maximum nested flows on the stack
    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: usize,

    /// Cursor moves per progression call before the flow is considered cyclic
    #[serde(default = "default_max_advances")]
    pub max_advances: u32,

    /// Unclear confirmation answers before the turn fails
    #[serde(default = "default_max_confirmation_retries")]
    pub max_confirmation_retries: u8,

    #[serde(default = "default_max_digression_depth")]
    pub max_digression_depth: u8,

    /// Action steps run in one turn before the engine suspends anyway
    #[serde(default = "default_max_chained_actions")]
    pub max_chained_actions: u32,

    /// Extra attempts for a retryable action failure
    #[serde(default = "default_max_action_retries")]
    pub max_action_retries: u32,

    /// Internal orchestrator iterations per turn
    #[serde(default = "default_max_turn_iterations")]
    pub max_turn_iterations: u32,

    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,
}

impl EngineConfig {
    /// Domain limits for the orchestrator and handlers
    pub fn limits(&self) -> EngineLimits {
        EngineLimits {
            max_stack_depth: self.max_stack_depth,
            max_advances: self.max_advances,
            max_confirmation_retries: self.max_confirmation_retries,
            max_digression_depth: self.max_digression_depth,
            max_chained_actions: self.max_chained_actions,
            max_action_retries: self.max_action_retries,
            max_turn_iterations: self.max_turn_iterations,
            classifier_timeout: Duration::from_millis(self.classifier_timeout_ms),
            action_timeout: Duration::from_millis(self.action_timeout_ms),
        }
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_stack_depth == 0 {
            return Err(ValidationError::ZeroLimit("max_stack_depth"));
        }
        if self.max_advances == 0 {
            return Err(ValidationError::ZeroLimit("max_advances"));
        }
        if self.max_confirmation_retries == 0 {
            return Err(ValidationError::ZeroLimit("max_confirmation_retries"));
        }
        if self.max_digression_depth == 0 {
            return Err(ValidationError::ZeroLimit("max_digression_depth"));
        }
        if self.max_chained_actions == 0 {
            return Err(ValidationError::ZeroLimit("max_chained_actions"));
        }
        if self.max_turn_iterations == 0 {
            return Err(ValidationError::ZeroLimit("max_turn_iterations"));
        }
        if self.classifier_timeout_ms == 0 || self.classifier_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ValidationError::InvalidTimeout("classifier_timeout_ms"));
        }
        if self.action_timeout_ms == 0 || self.action_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ValidationError::InvalidTimeout("action_timeout_ms"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: default_max_stack_depth(),
            max_advances: default_max_advances(),
            max_confirmation_retries: default_max_confirmation_retries(),
            max_digression_depth: default_max_digression_depth(),
            max_chained_actions: default_max_chained_actions(),
            max_action_retries: default_max_action_retries(),
            max_turn_iterations: default_max_turn_iterations(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
            action_timeout_ms: default_action_timeout_ms(),
        }
    }
}

fn default_max_stack_depth() -> usize {
    4
}

fn default_max_advances() -> u32 {
    64
}

fn default_max_confirmation_retries() -> u8 {
    3
}

fn default_max_digression_depth() -> u8 {
    3
}

fn default_max_chained_actions() -> u32 {
    8
}

fn default_max_action_retries() -> u32 {
    2
}

fn default_max_turn_iterations() -> u32 {
    128
}

fn default_classifier_timeout_ms() -> u64 {
    5_000
}

fn default_action_timeout_ms() -> u64 {
    10_000
}
