//! Command and query handlers.

pub mod dialogue;
