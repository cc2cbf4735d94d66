//! Turn state - the unit of persistence.
//!
//! Everything the engine knows about a session lives here and is
//! checkpointed as one value at the gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::errors::ErrorCategory;
use super::limits::EngineLimits;
use super::metadata::PatternMetadata;
use super::state::ConversationState;
use crate::domain::flow::{FlowInstance, FlowStack, SlotMap, SlotStore, SlotValue};
use crate::domain::foundation::{InstanceId, SessionId, SlotName, StateMachine};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub session_id: SessionId,
    pub flow_stack: FlowStack,
    pub slot_store: SlotStore,
    pub conversation_state: ConversationState,
    pub waiting_for_slot: Option<SlotName>,
    pub digression_depth: u8,
    #[serde(default)]
    pub pattern_metadata: PatternMetadata,
    /// Bare text of the last prompt emitted, re-emitted verbatim after side
    /// questions.
    #[serde(default)]
    pub active_prompt: Option<String>,
    #[serde(default)]
    pub last_error: Option<ErrorCategory>,
    #[serde(default)]
    pub turn_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl TurnState {
    pub fn new(session_id: SessionId, limits: &EngineLimits) -> Self {
        Self {
            session_id,
            flow_stack: FlowStack::new(limits.max_stack_depth),
            slot_store: SlotStore::new(),
            conversation_state: ConversationState::Idle,
            waiting_for_slot: None,
            digression_depth: 0,
            pattern_metadata: PatternMetadata::default(),
            active_prompt: None,
            last_error: None,
            turn_count: 0,
            updated_at: Utc::now(),
        }
    }

    /// Re-applies configured limits to a state loaded from a checkpoint.
    pub fn apply_limits(&mut self, limits: &EngineLimits) {
        self.flow_stack.set_max_depth(limits.max_stack_depth);
    }

    /// Moves to `next`. A move the transition table does not allow is
    /// still applied but logged, so the turn keeps going.
    pub fn enter(&mut self, next: ConversationState) {
        if !self.conversation_state.can_transition_to(&next) {
            warn!(
                session_id = %self.session_id,
                from = ?self.conversation_state,
                to = ?next,
                "Unexpected conversation state transition"
            );
        }
        self.conversation_state = next;
    }

    /// Clears everything except identity and counters.
    pub fn reset(&mut self) {
        self.flow_stack.clear();
        self.slot_store.clear();
        self.enter(ConversationState::Idle);
        self.waiting_for_slot = None;
        self.digression_depth = 0;
        self.pattern_metadata.clear();
        self.active_prompt = None;
        self.last_error = None;
    }

    pub fn active_instance(&self) -> Option<&FlowInstance> {
        self.flow_stack.active()
    }

    pub fn active_instance_id(&self) -> Option<InstanceId> {
        self.flow_stack.active().map(|i| i.instance_id)
    }

    /// Slots of the active instance; empty if the stack is empty.
    pub fn active_slots(&self) -> SlotMap {
        match self.flow_stack.active() {
            Some(instance) => self.slot_store.get_slots(instance.instance_id).clone(),
            None => SlotMap::new(),
        }
    }

    /// Writes a slot of the active instance. Returns false when there is no
    /// active instance.
    pub fn set_active_slot(&mut self, name: SlotName, value: SlotValue) -> bool {
        match self.active_instance_id() {
            Some(id) => {
                self.slot_store.set_slot(id, name, value);
                true
            }
            None => false,
        }
    }
}
