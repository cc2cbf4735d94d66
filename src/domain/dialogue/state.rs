//! Conversation state machine.
//!
//! One value per turn state. The orchestrator reads it to decide whether to
//! keep processing internally or suspend at the gate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where the conversation stands between (and within) turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// No task in progress.
    #[default]
    Idle,

    /// A message arrived while idle and is being routed.
    Understanding,

    /// Suspended on a `Collect` step.
    WaitingForSlot,

    /// Slot values are being checked before they are written.
    ValidatingSlot,

    /// The cursor rests on an `Action` or `Say` step.
    ReadyForAction,

    /// An action call is in flight.
    ExecutingAction,

    /// The cursor rests on a `Confirm` step that has not been asked yet.
    ReadyForConfirmation,

    /// Suspended on a `Confirm` step.
    Confirming,

    /// The active flow ran past its last step.
    Completed,

    /// A turn failed; the next turn starts from a clean slate.
    Error,
}

impl ConversationState {
    /// Returns true if the engine must wait for the user in this state.
    pub fn awaits_user(&self) -> bool {
        matches!(self, Self::Idle | Self::WaitingForSlot | Self::Confirming | Self::Error)
    }

    /// Returns true for states the orchestrator keeps processing internally.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::ReadyForAction | Self::ExecutingAction | Self::Completed)
    }

    const ALL: [ConversationState; 10] = [
        Self::Idle,
        Self::Understanding,
        Self::WaitingForSlot,
        Self::ValidatingSlot,
        Self::ReadyForAction,
        Self::ExecutingAction,
        Self::ReadyForConfirmation,
        Self::Confirming,
        Self::Completed,
        Self::Error,
    ];
}

impl StateMachine for ConversationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationState::*;
        match (self, target) {
            // Error only clears back to Idle
            (Error, Idle) => true,
            (Error, _) => false,
            (_, Idle) | (_, Error) => true,
            (Idle | Understanding | Completed, Understanding) => true,
            (ValidatingSlot | ExecutingAction, ValidatingSlot) => false,
            (_, ValidatingSlot) => true,
            (ReadyForAction, ExecutingAction) => true,
            (ReadyForConfirmation | Confirming, Confirming) => true,
            // Settled states: reachable after any handler or internal step
            (_, WaitingForSlot | ReadyForAction | ReadyForConfirmation | Completed) => true,
            _ => false,
        }
    }

    fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }
}
