//! Classifier Port - turns a raw utterance into a `ClassifiedMessage`.
//!
//! Classification itself is opaque to the engine. The port only fixes what
//! the classifier is told about the conversation and what it must return.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::dialogue::{ClassifiedMessage, ConversationState};
use crate::domain::flow::SlotMap;
use crate::domain::foundation::{FlowName, SlotName};

/// Port for utterance classification.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one utterance.
    ///
    /// The caller applies its own timeout; implementations should not retry
    /// internally for longer than that.
    async fn classify(
        &self,
        utterance: &str,
        context: &ClassificationContext,
    ) -> Result<ClassifiedMessage, ClassifierError>;
}

/// What the classifier knows about the conversation when it classifies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationContext {
    /// Flow of the active instance, if any.
    pub active_flow: Option<FlowName>,
    /// Slots the active flow still needs, in definition order.
    pub expected_slots: Vec<SlotName>,
    /// The slot the last prompt asked for. Classifiers rely on this to read
    /// short answers ("Madrid") as slot values.
    pub currently_prompted_slot: Option<SlotName>,
    /// Flows an interruption may start.
    pub available_flows: Vec<FlowName>,
    /// Values the active instance already holds.
    pub slot_history: SlotMap,
    pub conversation_state: ConversationState,
}

/// Errors from classifier calls.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ClassifierError {
    /// The classifier did not answer in time.
    #[error("classifier timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Backend could not be reached.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with something that is not a classified message.
    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
}
