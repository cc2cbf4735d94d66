//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the dialogue engine and its collaborators. Adapters implement these ports.
//!
//! - `Classifier` - Utterance to `ClassifiedMessage`
//! - `FlowDefinitionProvider` - Read-only flow definitions
//! - `ActionExecutor` - Business logic behind `Action` steps
//! - `CheckpointStore` - `TurnState` persistence at the gate

mod action_executor;
mod checkpoint_store;
mod classifier;
mod flow_provider;

pub use action_executor::{ActionError, ActionExecutor, ActionPayload};
pub use checkpoint_store::{CheckpointError, CheckpointStore};
pub use classifier::{ClassificationContext, Classifier, ClassifierError};
pub use flow_provider::{FlowDefinitionError, FlowDefinitionProvider};
