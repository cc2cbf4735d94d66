//! Flow Definition Provider Port - source of flow definitions.
//!
//! The engine treats definitions as read-only. How they are authored and
//! compiled is the provider's business.

use async_trait::async_trait;

use crate::domain::flow::FlowDefinition;
use crate::domain::foundation::FlowName;

#[async_trait]
pub trait FlowDefinitionProvider: Send + Sync {
    /// Definition for `name`, `Ok(None)` if there is no such flow.
    async fn get_definition(&self, name: &FlowName) -> Result<Option<FlowDefinition>, FlowDefinitionError>;

    /// Names of every flow that can be started.
    async fn available_flows(&self) -> Result<Vec<FlowName>, FlowDefinitionError>;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FlowDefinitionError {
    #[error("flow definitions unavailable: {0}")]
    Unavailable(String),

    #[error("invalid definition for flow '{flow}': {reason}")]
    Invalid { flow: FlowName, reason: String },
}
