//! Dialogue module - turn state, classified messages, and the pattern
//! handlers that consume them.

mod catalog;
mod emission;
mod errors;
mod limits;
mod message;
mod metadata;
pub mod patterns;
mod responses;
mod state;
mod turn_state;

pub use catalog::{FlowCatalog, HandlerContext};
pub use emission::{join_text, Emission, HandlerEmission};
pub use errors::{EngineError, ErrorCategory};
pub use limits::{timeout_millis, EngineLimits};
pub use message::ClassifiedMessage;
pub use metadata::{ConfirmationMeta, CorrectionMeta, ModificationMeta, PatternMeta, PatternMetadata};
pub use responses::{ApologyTemplates, ResponseTemplates};
pub use state::ConversationState;
pub use turn_state::TurnState;
