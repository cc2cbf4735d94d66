//! Step Progression Engine.
//!
//! Pure functions over `(FlowDefinition, FlowInstance, SlotMap)`. The only
//! state it mutates is the instance's step cursor.

mod engine;
mod errors;

pub use engine::{ActionCall, AdvanceResult, StepProgression, DEFAULT_MAX_ADVANCES};
pub use errors::ProgressionError;
