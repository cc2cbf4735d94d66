//! Flow instances - one running activation of a flow definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::slots::SlotValue;
use crate::domain::foundation::{FlowName, InstanceId, StateMachine, StepId};

/// Lifecycle of a flow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// Top of the stack, receives routed messages.
    #[default]
    Active,
    /// Below the top of the stack, cursor frozen.
    Paused,
    /// Ran past its last step.
    Completed,
    /// Popped by a cancellation.
    Cancelled,
}

impl StateMachine for FlowStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FlowStatus::*;
        matches!(
            (self, target),
            (Active, Paused) | (Paused, Active) | (Active, Completed) | (Active, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FlowStatus::*;
        match self {
            Active => vec![Paused, Completed, Cancelled],
            Paused => vec![Active],
            Completed | Cancelled => vec![],
        }
    }
}

/// One activation of a flow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInstance {
    pub instance_id: InstanceId,
    pub definition_name: FlowName,
    /// Step cursor; `None` means "not started", i.e. the first step.
    pub current_step: Option<StepId>,
    pub status: FlowStatus,
    pub started_at: DateTime<Utc>,
    /// Values produced by action steps, keyed by action output name.
    #[serde(default)]
    pub outputs: BTreeMap<String, SlotValue>,
}

impl FlowInstance {
    pub fn new(definition_name: FlowName, initial_step: Option<StepId>) -> Self {
        Self {
            instance_id: InstanceId::new(),
            definition_name,
            current_step: initial_step,
            status: FlowStatus::Active,
            started_at: Utc::now(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FlowStatus::Active
    }
}
