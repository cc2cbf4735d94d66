//! Classified messages - the closed set of things a user utterance can mean.

use serde::{Deserialize, Serialize};

use crate::domain::flow::SlotValue;
use crate::domain::foundation::{FlowName, SlotName};

/// Output of the external classifier. Exactly one variant per utterance.
///
/// A missing value inside a variant (`Confirmation { value: None }`) is a
/// legal "unclear" signal, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum ClassifiedMessage {
    /// Provides one or more slot values.
    SlotValue { slots: Vec<(SlotName, SlotValue)> },
    /// Fixes a value the user gave earlier.
    Correction { slots: Vec<(SlotName, SlotValue)> },
    /// Changes a value on purpose (usually after declining a confirmation).
    Modification { slots: Vec<(SlotName, SlotValue)> },
    /// Answers a confirmation question.
    Confirmation {
        #[serde(default)]
        value: Option<bool>,
    },
    /// Starts another task on top of the current one.
    Interruption { target_flow: FlowName },
    /// A side question that must not disturb the task.
    Digression { topic: String },
    /// Asks why something is needed.
    Clarification {
        #[serde(default)]
        target_slot: Option<SlotName>,
    },
    /// Abandons the active task.
    Cancellation,
    /// Nothing new; keep going.
    Continuation,
}

impl ClassifiedMessage {
    /// Shorthand for a `SlotValue` message.
    pub fn slot_value<I, K>(slots: I) -> Self
    where
        I: IntoIterator<Item = (K, SlotValue)>,
        K: Into<SlotName>,
    {
        ClassifiedMessage::SlotValue {
            slots: slots.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn correction<I, K>(slots: I) -> Self
    where
        I: IntoIterator<Item = (K, SlotValue)>,
        K: Into<SlotName>,
    {
        ClassifiedMessage::Correction {
            slots: slots.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn confirm(value: Option<bool>) -> Self {
        ClassifiedMessage::Confirmation { value }
    }

    pub fn interrupt(target_flow: impl Into<FlowName>) -> Self {
        ClassifiedMessage::Interruption {
            target_flow: target_flow.into(),
        }
    }

    /// Pattern name for logs.
    pub fn pattern(&self) -> &'static str {
        match self {
            ClassifiedMessage::SlotValue { .. } => "slot_value",
            ClassifiedMessage::Correction { .. } => "correction",
            ClassifiedMessage::Modification { .. } => "modification",
            ClassifiedMessage::Confirmation { .. } => "confirmation",
            ClassifiedMessage::Interruption { .. } => "interruption",
            ClassifiedMessage::Digression { .. } => "digression",
            ClassifiedMessage::Clarification { .. } => "clarification",
            ClassifiedMessage::Cancellation => "cancellation",
            ClassifiedMessage::Continuation => "continuation",
        }
    }
}
