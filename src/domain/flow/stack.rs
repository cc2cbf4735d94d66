//! Flow Stack - the LIFO of nested task instances.
//!
//! The last element is the active instance; every other instance is paused.
//! `push` and `pop` are the only operations that change stack order.

use serde::{Deserialize, Serialize};

use super::errors::FlowStackError;
use super::instance::{FlowInstance, FlowStatus};
use crate::domain::foundation::{FlowName, InstanceId, StepId};

/// Default bound on nesting depth.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 4;

fn default_max_depth() -> usize {
    DEFAULT_MAX_STACK_DEPTH
}

/// Ordered stack of flow instances with bounded depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStack {
    instances: Vec<FlowInstance>,
    #[serde(default = "default_max_depth")]
    max_depth: usize,
}

impl Default for FlowStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STACK_DEPTH)
    }
}

impl FlowStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            instances: Vec::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Applies a new depth bound. Existing instances are never dropped;
    /// the bound only affects later pushes.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Starts a new instance on top of the stack and pauses the previous top.
    ///
    /// # Errors
    ///
    /// Returns `StackDepthExceeded` if the stack is already at its bound.
    pub fn push(
        &mut self,
        definition_name: FlowName,
        initial_step: Option<StepId>,
    ) -> Result<InstanceId, FlowStackError> {
        if self.instances.len() >= self.max_depth {
            return Err(FlowStackError::StackDepthExceeded {
                limit: self.max_depth,
            });
        }

        if let Some(top) = self.instances.last_mut() {
            top.status = FlowStatus::Paused;
        }

        let instance = FlowInstance::new(definition_name, initial_step);
        let instance_id = instance.instance_id;
        self.instances.push(instance);
        Ok(instance_id)
    }

    /// Removes the active instance and resumes the one below it.
    ///
    /// The returned instance keeps its last status; callers record why it
    /// left the stack (see [`FlowStack::finish_active`]).
    ///
    /// # Errors
    ///
    /// Returns `EmptyStack` if there is nothing to pop.
    pub fn pop(&mut self) -> Result<FlowInstance, FlowStackError> {
        let popped = self.instances.pop().ok_or(FlowStackError::EmptyStack)?;

        if let Some(top) = self.instances.last_mut() {
            top.status = FlowStatus::Active;
        }

        Ok(popped)
    }

    /// Pops the active instance, marking it `Completed` or `Cancelled`.
    pub fn finish_active(&mut self, status: FlowStatus) -> Result<FlowInstance, FlowStackError> {
        let mut popped = self.pop()?;
        popped.status = status;
        Ok(popped)
    }

    /// Top of the stack, `None` if empty.
    pub fn active(&self) -> Option<&FlowInstance> {
        self.instances.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut FlowInstance> {
        self.instances.last_mut()
    }

    pub fn get(&self, instance_id: InstanceId) -> Option<&FlowInstance> {
        self.instances.iter().find(|i| i.instance_id == instance_id)
    }

    /// Instances bottom to top.
    pub fn instances(&self) -> &[FlowInstance] {
        &self.instances
    }

    pub fn depth(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Distinct flow names on the stack.
    pub fn flow_names(&self) -> Vec<FlowName> {
        let mut names: Vec<FlowName> = Vec::new();
        for instance in &self.instances {
            if !names.contains(&instance.definition_name) {
                names.push(instance.definition_name.clone());
            }
        }
        names
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}
