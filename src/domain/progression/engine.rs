//! Step Progression Engine.
//!
//! Walks a flow definition for one instance: finds the step under the
//! cursor, decides whether it is already satisfied, and advances. Knows
//! nothing about message classification.
//!
//! # Skipping satisfied steps
//!
//! A single utterance may fill several slots at once ("fly from New York to
//! Los Angeles"). `skip_to_actionable` moves the cursor over every `Collect`
//! step whose slot is already present so none of them is asked again. The
//! loop spends an advance budget per move and fails with
//! `MaxAdvancesExceeded` instead of spinning on a cyclic definition.

use std::collections::BTreeMap;

use super::errors::ProgressionError;
use crate::domain::flow::{
    render_with_slots, FlowDefinition, FlowInstance, SlotMap, SlotValue, StepSpec,
};
use crate::domain::foundation::{FlowName, SlotName, StepId};

/// Default ceiling on cursor moves within a single progression call.
pub const DEFAULT_MAX_ADVANCES: u32 = 64;

/// An action the orchestrator must execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    pub call: String,
    pub input_map: BTreeMap<String, SlotName>,
    pub output_map: BTreeMap<String, SlotName>,
}

impl ActionCall {
    /// Builds the action's input payload from the instance's slots.
    ///
    /// With an empty `input_map` every slot is passed under its own name.
    /// Mapped slots that are not filled are omitted.
    pub fn inputs(&self, slots: &SlotMap) -> BTreeMap<String, SlotValue> {
        if self.input_map.is_empty() {
            return slots
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                .collect();
        }

        self.input_map
            .iter()
            .filter_map(|(param, slot)| slots.get(slot).map(|v| (param.clone(), v.clone())))
            .collect()
    }

    /// Maps raw action outputs onto slot names via `output_map`.
    /// Unmapped output keys are not written to slots.
    pub fn output_slots(&self, outputs: &BTreeMap<String, SlotValue>) -> Vec<(SlotName, SlotValue)> {
        self.output_map
            .iter()
            .filter_map(|(key, slot)| outputs.get(key).map(|v| (slot.clone(), v.clone())))
            .collect()
    }
}

/// What the flow needs at the cursor after a progression call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceResult {
    /// Waiting on the user for this slot.
    NeedsCollect(SlotName),
    /// An action must run before anything else happens.
    NeedsAction(ActionCall),
    /// Waiting on the user to confirm this (rendered) message.
    NeedsConfirm(String),
    /// A message to emit before moving on.
    Say(String),
    /// The cursor is past the last step.
    FlowComplete,
}

impl AdvanceResult {
    /// Whether the engine must stop and wait for the user.
    pub fn awaits_user(&self) -> bool {
        matches!(self, AdvanceResult::NeedsCollect(_) | AdvanceResult::NeedsConfirm(_))
    }
}

/// Cursor-move counter shared across one progression call.
struct AdvanceBudget<'a> {
    flow: &'a FlowName,
    limit: u32,
    spent: u32,
}

impl<'a> AdvanceBudget<'a> {
    fn new(flow: &'a FlowName, limit: u32) -> Self {
        Self {
            flow,
            limit,
            spent: 0,
        }
    }

    fn spend(&mut self) -> Result<(), ProgressionError> {
        self.spent += 1;
        if self.spent > self.limit {
            return Err(ProgressionError::MaxAdvancesExceeded {
                flow: self.flow.clone(),
                limit: self.limit,
            });
        }
        Ok(())
    }
}

/// Step progression over one flow definition.
#[derive(Debug, Clone, Copy)]
pub struct StepProgression<'a> {
    definition: &'a FlowDefinition,
    max_advances: u32,
}

impl<'a> StepProgression<'a> {
    pub fn new(definition: &'a FlowDefinition, max_advances: u32) -> Self {
        Self {
            definition,
            max_advances,
        }
    }

    pub fn definition(&self) -> &'a FlowDefinition {
        self.definition
    }

    /// Step under the cursor, or the first step if the cursor is unset.
    /// `None` once the cursor is past the last step.
    pub fn current_step(&self, instance: &FlowInstance) -> Option<(StepId, &'a StepSpec)> {
        let id = instance.current_step.unwrap_or(StepId::FIRST);
        self.definition.step(id).map(|step| (id, step))
    }

    /// A `Collect` step is complete once its slot is present. Every other
    /// kind of step runs exactly once when reached and is never complete.
    pub fn is_complete(&self, step: &StepSpec, slots: &SlotMap) -> bool {
        match step {
            StepSpec::Collect { slot, .. } => slots.contains_key(slot),
            StepSpec::Action { .. }
            | StepSpec::Confirm { .. }
            | StepSpec::Branch { .. }
            | StepSpec::Say { .. } => false,
        }
    }

    /// Moves the cursor to the next step in definition order and reports
    /// what that step needs. Branches landed on are resolved in place.
    pub fn advance(
        &self,
        instance: &mut FlowInstance,
        slots: &SlotMap,
    ) -> Result<AdvanceResult, ProgressionError> {
        let mut budget = AdvanceBudget::new(&self.definition.name, self.max_advances);
        self.step_forward(instance);
        self.resolve(instance, slots, &mut budget)
    }

    /// Advances over every already-satisfied step and returns the first
    /// need that is not.
    ///
    /// # Errors
    ///
    /// `MaxAdvancesExceeded` if more than `max_advances` cursor moves are
    /// needed, which only happens on a cyclic definition.
    pub fn skip_to_actionable(
        &self,
        instance: &mut FlowInstance,
        slots: &SlotMap,
    ) -> Result<AdvanceResult, ProgressionError> {
        let mut budget = AdvanceBudget::new(&self.definition.name, self.max_advances);
        let mut result = self.resolve(instance, slots, &mut budget)?;

        while let Some((_, step)) = self.current_step(instance) {
            if !self.is_complete(step, slots) {
                break;
            }
            budget.spend()?;
            self.step_forward(instance);
            result = self.resolve(instance, slots, &mut budget)?;
        }

        Ok(result)
    }

    /// Need at the cursor without moving it. Used when a paused instance
    /// resumes. `None` if the cursor rests on an unresolved branch.
    pub fn current_need(&self, instance: &FlowInstance, slots: &SlotMap) -> Option<AdvanceResult> {
        match self.current_step(instance) {
            Some((_, StepSpec::Branch { .. })) => None,
            Some((_, step)) => Some(self.need_for(step, slots)),
            None => Some(AdvanceResult::FlowComplete),
        }
    }

    /// Describes a step as the need it represents.
    pub fn need_for(&self, step: &StepSpec, slots: &SlotMap) -> AdvanceResult {
        match step {
            StepSpec::Collect { slot, .. } => AdvanceResult::NeedsCollect(slot.clone()),
            StepSpec::Action {
                call,
                input_map,
                output_map,
            } => AdvanceResult::NeedsAction(ActionCall {
                call: call.clone(),
                input_map: input_map.clone(),
                output_map: output_map.clone(),
            }),
            StepSpec::Confirm { message_template } => {
                AdvanceResult::NeedsConfirm(render_with_slots(message_template, slots))
            }
            StepSpec::Say { message } => AdvanceResult::Say(render_with_slots(message, slots)),
            // Branches are resolved before a need is described; reaching one
            // here means the caller skipped `resolve`.
            StepSpec::Branch { .. } => AdvanceResult::FlowComplete,
        }
    }

    fn step_forward(&self, instance: &mut FlowInstance) {
        let next = match self.current_step(instance) {
            Some((id, _)) => id.next(),
            None => self.definition.end(),
        };
        instance.current_step = Some(next);
    }

    /// Pins the cursor and follows branches until it rests on a non-branch
    /// step (or past the end).
    fn resolve(
        &self,
        instance: &mut FlowInstance,
        slots: &SlotMap,
        budget: &mut AdvanceBudget<'_>,
    ) -> Result<AdvanceResult, ProgressionError> {
        loop {
            let Some((id, step)) = self.current_step(instance) else {
                return Ok(AdvanceResult::FlowComplete);
            };
            instance.current_step = Some(id);

            match step {
                StepSpec::Branch { cond, goto } => {
                    budget.spend()?;
                    instance.current_step = Some(if cond.holds(slots) { *goto } else { id.next() });
                }
                other => return Ok(self.need_for(other, slots)),
            }
        }
    }
}
