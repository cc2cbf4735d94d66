//! Flow Adapters - Implementations of the FlowDefinitionProvider port.

mod in_memory_flow_provider;

pub use in_memory_flow_provider::InMemoryFlowProvider;
