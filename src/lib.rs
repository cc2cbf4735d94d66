//! Dialogue Engine - multi-turn conversation orchestration
//!
//! Drives nested, slot-filling task flows from classified user messages.
//! A conversation is a stack of flow instances; each turn dispatches one
//! `ClassifiedMessage` to its pattern handler, runs any internal steps
//! (actions, messages, completions) and suspends at the Human Input Gate,
//! where the turn state is checkpointed.
//!
//! # Layout
//!
//! - `domain` - flow stack, step progression, pattern handlers, turn state
//! - `ports` - classifier, flow provider, action executor, checkpoint store
//! - `adapters` - in-memory and file implementations of the ports
//! - `application` - turn orchestrator, Human Input Gate, session router
//! - `config` - environment-driven configuration and tracing setup

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
