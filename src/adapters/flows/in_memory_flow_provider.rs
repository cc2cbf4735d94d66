//! In-Memory Flow Definition Provider
//!
//! Serves flow definitions registered up front, either built in code or
//! parsed from a YAML document. Definitions are validated on the way in.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::flow::FlowDefinition;
use crate::domain::foundation::FlowName;
use crate::ports::{FlowDefinitionError, FlowDefinitionProvider};

/// In-memory flow definition provider
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlowProvider {
    flows: Arc<RwLock<BTreeMap<FlowName, FlowDefinition>>>,
}

impl InMemoryFlowProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a provider from definitions, rejecting any invalid one.
    pub fn with_flows<I>(definitions: I) -> Result<Self, FlowDefinitionError>
    where
        I: IntoIterator<Item = FlowDefinition>,
    {
        let mut flows = BTreeMap::new();
        for definition in definitions {
            validate(&definition)?;
            flows.insert(definition.name.clone(), definition);
        }
        Ok(Self {
            flows: Arc::new(RwLock::new(flows)),
        })
    }

    /// Parses a YAML list of flow definitions.
    ///
    /// ```yaml
    /// - name: check_weather
    ///   steps:
    ///     - type: collect
    ///       slot: city
    ///     - type: action
    ///       call: weather_lookup
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FlowDefinitionError> {
        let definitions: Vec<FlowDefinition> = serde_yaml::from_str(yaml)
            .map_err(|e| FlowDefinitionError::Unavailable(format!("invalid flow YAML: {}", e)))?;
        Self::with_flows(definitions)
    }

    /// Adds or replaces a definition.
    pub async fn register(&self, definition: FlowDefinition) -> Result<(), FlowDefinitionError> {
        validate(&definition)?;
        self.flows
            .write()
            .await
            .insert(definition.name.clone(), definition);
        Ok(())
    }
}

fn validate(definition: &FlowDefinition) -> Result<(), FlowDefinitionError> {
    definition
        .validate()
        .map_err(|e| FlowDefinitionError::Invalid {
            flow: definition.name.clone(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl FlowDefinitionProvider for InMemoryFlowProvider {
    async fn get_definition(&self, name: &FlowName) -> Result<Option<FlowDefinition>, FlowDefinitionError> {
        Ok(self.flows.read().await.get(name).cloned())
    }

    async fn available_flows(&self) -> Result<Vec<FlowName>, FlowDefinitionError> {
        Ok(self.flows.read().await.keys().cloned().collect())
    }
}
