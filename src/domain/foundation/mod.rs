//! Foundation module - Shared domain primitives.
//!
//! Identifiers, the state machine trait, and validation errors that form
//! the vocabulary of the dialogue engine.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{FlowName, InstanceId, SessionId, SlotName, StepId};
pub use state_machine::StateMachine;
