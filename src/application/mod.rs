//! Application layer - Turn orchestration, the Human Input Gate, and session routing.
//!
//! This layer coordinates the domain's pattern handlers with the ports.
//! Following CQRS, the gate's `resume` is the single command and
//! `GetTurnState` the single query; the router sits in front of both.

pub mod handlers;
pub mod orchestrator;
pub mod session_router;

pub use handlers::dialogue::{
    GateError, GetTurnStateError, GetTurnStateHandler, GetTurnStateQuery, HumanInputGate,
};
pub use orchestrator::{TurnOrchestrator, TurnOutcome};
pub use session_router::{SessionRouter, SessionRouterError};
