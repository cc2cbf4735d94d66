//! Dialogue Command and Query Handlers
//!
//! ## Commands
//! - `HumanInputGate::resume` - Classify the user's input and run one turn
//!
//! ## Queries
//! - `GetTurnState` - Last checkpointed `TurnState` for a session

mod get_turn_state;
mod resume_turn;

pub use get_turn_state::{GetTurnStateError, GetTurnStateHandler, GetTurnStateQuery};
pub use resume_turn::{GateError, HumanInputGate};
