//! Flow Stack & Slot Store.
//!
//! Owns the nested-task stack, per-instance slot data, and the flow
//! definition model. Knows nothing about messages; step progression lives
//! in `domain::progression`.

mod definition;
mod errors;
mod instance;
mod slots;
mod stack;
mod template;

pub use definition::{BranchCondition, FlowDefinition, SlotRule, StepSpec};
pub use errors::FlowStackError;
pub use instance::{FlowInstance, FlowStatus};
pub use slots::{display_value, SlotMap, SlotStore, SlotValue};
pub use stack::{FlowStack, DEFAULT_MAX_STACK_DEPTH};
pub use template::{render_template, render_with_slots};
