//! Domain layer: the dialogue engine's state and rules, free of I/O.
//!
//! # Module Organization
//!
//! - `foundation` - Identifiers, the state machine trait, validation errors
//! - `flow` - Flow definitions, instances, the flow stack and slot store
//! - `progression` - Step progression over one flow instance
//! - `dialogue` - Turn state, classified messages, and the pattern handlers

pub mod dialogue;
pub mod flow;
pub mod foundation;
pub mod progression;
