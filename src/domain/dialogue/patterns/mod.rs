//! Pattern Handlers.
//!
//! One handler per `ClassifiedMessage` variant. Each takes the turn state by
//! value together with the message payload and returns the next state plus
//! a `HandlerEmission`. Handlers never call collaborators; actions run in
//! the orchestrator.
//!
//! The helpers below are shared by the handlers and by the orchestrator's
//! internal loop so that "what does the flow need now" always maps onto
//! conversation state and prompts the same way.

pub mod cancellation;
pub mod clarification;
pub mod confirmation;
pub mod continuation;
pub mod correction;
pub mod digression;
pub mod interruption;
pub mod modification;
pub mod slot_value;

use std::iter;
use std::sync::Arc;

use super::catalog::HandlerContext;
use super::emission::{join_text, HandlerEmission};
use super::errors::EngineError;
use super::responses::ResponseTemplates;
use super::state::ConversationState;
use super::turn_state::TurnState;
use crate::domain::flow::{display_value, FlowDefinition, SlotValue, StepSpec};
use crate::domain::foundation::{InstanceId, SlotName};
use crate::domain::progression::{AdvanceResult, StepProgression};

/// Result of every pattern handler.
pub type HandlerResult = Result<(TurnState, HandlerEmission), EngineError>;

/// The active instance and its definition, `None` when the stack is empty.
///
/// # Errors
///
/// `UnknownFlow` if the active instance's definition is not in the catalog.
pub fn active_flow(
    ctx: &HandlerContext<'_>,
    state: &TurnState,
) -> Result<Option<(InstanceId, Arc<FlowDefinition>)>, EngineError> {
    match state.active_instance() {
        Some(instance) => {
            let definition = ctx.catalog.require(&instance.definition_name)?;
            Ok(Some((instance.instance_id, definition)))
        }
        None => Ok(None),
    }
}

/// Runs `skip_to_actionable` on the active instance.
pub fn skip_active(
    ctx: &HandlerContext<'_>,
    state: &mut TurnState,
    definition: &FlowDefinition,
) -> Result<AdvanceResult, EngineError> {
    let progression = StepProgression::new(definition, ctx.limits.max_advances);
    let TurnState {
        flow_stack,
        slot_store,
        ..
    } = state;
    let instance = flow_stack.active_mut().ok_or(EngineError::EmptyStack)?;
    let slots = slot_store.get_slots(instance.instance_id);
    Ok(progression.skip_to_actionable(instance, slots)?)
}

/// Runs `advance` on the active instance.
pub fn advance_active(
    ctx: &HandlerContext<'_>,
    state: &mut TurnState,
    definition: &FlowDefinition,
) -> Result<AdvanceResult, EngineError> {
    let progression = StepProgression::new(definition, ctx.limits.max_advances);
    let TurnState {
        flow_stack,
        slot_store,
        ..
    } = state;
    let instance = flow_stack.active_mut().ok_or(EngineError::EmptyStack)?;
    let slots = slot_store.get_slots(instance.instance_id);
    Ok(progression.advance(instance, slots)?)
}

/// Moves the conversation to match what the flow needs.
///
/// User-facing needs suspend with a prompt; everything else tells the
/// orchestrator to continue.
pub fn settle(
    ctx: &HandlerContext<'_>,
    state: &mut TurnState,
    definition: &FlowDefinition,
    result: AdvanceResult,
    preface: Option<String>,
) -> HandlerEmission {
    match result {
        AdvanceResult::NeedsCollect(slot) => {
            let prompt = slot_prompt(ctx, definition, &slot);
            state.waiting_for_slot = Some(slot);
            state.enter(ConversationState::WaitingForSlot);
            suspend(state, preface, prompt)
        }
        AdvanceResult::NeedsConfirm(text) => {
            state.waiting_for_slot = None;
            state.enter(ConversationState::ReadyForConfirmation);
            state.enter(ConversationState::Confirming);
            suspend(state, preface, text)
        }
        AdvanceResult::NeedsAction(_) | AdvanceResult::Say(_) => {
            state.waiting_for_slot = None;
            state.enter(ConversationState::ReadyForAction);
            HandlerEmission::continue_with(preface)
        }
        AdvanceResult::FlowComplete => {
            state.waiting_for_slot = None;
            state.enter(ConversationState::Completed);
            HandlerEmission::continue_with(preface)
        }
    }
}

/// Suspends on `prompt`, remembering it as the active prompt.
pub fn suspend(state: &mut TurnState, preface: Option<String>, prompt: String) -> HandlerEmission {
    let text = with_preface(preface.as_deref(), &prompt);
    state.active_prompt = Some(prompt);
    HandlerEmission::Prompt(text)
}

/// Returns to `Idle` with the idle prompt.
pub fn idle(ctx: &HandlerContext<'_>, state: &mut TurnState, preface: Option<String>) -> HandlerEmission {
    state.waiting_for_slot = None;
    state.enter(ConversationState::Idle);
    suspend(state, preface, ctx.responses.idle_prompt.clone())
}

/// Repeats the active prompt verbatim without touching any state.
pub fn reemit(ctx: &HandlerContext<'_>, state: &TurnState, preface: Option<String>) -> HandlerEmission {
    let prompt = state
        .active_prompt
        .as_deref()
        .unwrap_or(&ctx.responses.idle_prompt);
    HandlerEmission::Prompt(with_preface(preface.as_deref(), prompt))
}

/// Re-enters the instance that just became active after a pop, keeping its
/// cursor where it was.
pub fn resume_parent(
    ctx: &HandlerContext<'_>,
    state: &mut TurnState,
    preface: Option<String>,
) -> Result<HandlerEmission, EngineError> {
    let Some((instance_id, definition)) = active_flow(ctx, state)? else {
        return Ok(idle(ctx, state, preface));
    };

    let resuming = ResponseTemplates::render(
        &ctx.responses.resuming,
        &[("flow", &definition.name.humanized())],
    );
    let preface = Some(join_text(preface.iter().map(String::as_str).chain(iter::once(resuming.as_str()))));

    let progression = StepProgression::new(&definition, ctx.limits.max_advances);
    let need = state
        .active_instance()
        .and_then(|instance| progression.current_need(instance, state.slot_store.get_slots(instance_id)));

    let need = match need {
        Some(need) => need,
        None => skip_active(ctx, state, &definition)?,
    };

    Ok(settle(ctx, state, &definition, need, preface))
}

/// Prompt for a collect step: its own prompt text or the generic one.
pub fn slot_prompt(ctx: &HandlerContext<'_>, definition: &FlowDefinition, slot: &SlotName) -> String {
    if let Some((
        _,
        StepSpec::Collect {
            prompt: Some(prompt),
            ..
        },
    )) = definition.collect_step_for(slot)
    {
        return prompt.clone();
    }

    ResponseTemplates::render(
        &ctx.responses.slot_prompt,
        &[
            ("slot", &slot.humanized()),
            ("flow", &definition.name.humanized()),
        ],
    )
}

/// Slots accepted and rejected by `write_slots`.
#[derive(Debug, Default)]
pub struct SlotWrite {
    pub written: Vec<(SlotName, SlotValue)>,
    /// Rejection text for every value that failed its rule.
    pub rejection: Option<String>,
}

/// Validates and writes slot values to the active instance. Values that
/// fail their collect step's rule are not written.
pub fn write_slots(
    ctx: &HandlerContext<'_>,
    state: &mut TurnState,
    definition: &FlowDefinition,
    slots: Vec<(SlotName, SlotValue)>,
) -> SlotWrite {
    let mut outcome = SlotWrite::default();
    let Some(instance_id) = state.active_instance_id() else {
        return outcome;
    };

    let mut rejections = Vec::new();
    for (name, value) in slots {
        if let Some(Err(reason)) = definition.rule_for(&name).map(|rule| rule.check(&value)) {
            rejections.push(ResponseTemplates::render(
                &ctx.responses.invalid_slot,
                &[("slot", &name.humanized()), ("reason", &reason)],
            ));
            continue;
        }
        state.slot_store.set_slot(instance_id, name.clone(), value.clone());
        outcome.written.push((name, value));
    }

    if !rejections.is_empty() {
        outcome.rejection = Some(join_text(&rejections));
    }
    outcome
}

/// "origin to Denver, date to Friday"
pub fn describe_slots(slots: &[(SlotName, SlotValue)]) -> String {
    slots
        .iter()
        .map(|(name, value)| format!("{} to {}", name.humanized(), display_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn with_preface(preface: Option<&str>, prompt: &str) -> String {
    join_text(preface.into_iter().chain(iter::once(prompt)))
}
