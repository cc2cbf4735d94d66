//! Per-turn snapshot of the flow definitions a turn may touch.

use std::collections::HashMap;
use std::sync::Arc;

use super::errors::EngineError;
use super::limits::EngineLimits;
use super::responses::ResponseTemplates;
use crate::domain::flow::FlowDefinition;
use crate::domain::foundation::FlowName;

/// Immutable set of definitions, fixed for the duration of one turn.
#[derive(Debug, Clone, Default)]
pub struct FlowCatalog {
    flows: HashMap<FlowName, Arc<FlowDefinition>>,
}

impl FlowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow(mut self, definition: FlowDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn insert(&mut self, definition: FlowDefinition) {
        self.flows.insert(definition.name.clone(), Arc::new(definition));
    }

    pub fn get(&self, name: &FlowName) -> Option<Arc<FlowDefinition>> {
        self.flows.get(name).cloned()
    }

    /// Like `get`, but a missing definition is an error.
    pub fn require(&self, name: &FlowName) -> Result<Arc<FlowDefinition>, EngineError> {
        self.get(name).ok_or_else(|| EngineError::UnknownFlow(name.clone()))
    }

    pub fn contains(&self, name: &FlowName) -> bool {
        self.flows.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Read-only inputs shared by every pattern handler.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub catalog: &'a FlowCatalog,
    pub limits: &'a EngineLimits,
    pub responses: &'a ResponseTemplates,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        catalog: &'a FlowCatalog,
        limits: &'a EngineLimits,
        responses: &'a ResponseTemplates,
    ) -> Self {
        Self {
            catalog,
            limits,
            responses,
        }
    }
}
