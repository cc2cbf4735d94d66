//! Turn Orchestrator - the single dispatch site for classified messages.
//!
//! A turn dispatches one `ClassifiedMessage` to its pattern handler and then
//! keeps driving the active flow (actions, `Say` steps, completions) until
//! something needs the user. Nothing is persisted here; the caller checkpoints
//! the returned state at the Human Input Gate.
//!
//! Every turn works on an owned `TurnState`. If the turn fails, the pre-turn
//! snapshot is returned in `Error` instead, so a partially advanced state is
//! never handed back.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::domain::dialogue::patterns::{
    self, active_flow, advance_active, cancellation, clarification, confirmation, continuation,
    correction, digression, interruption, modification, settle, skip_active, slot_value,
    suspend, HandlerResult,
};
use crate::domain::dialogue::{
    join_text, timeout_millis, ClassifiedMessage, ConversationState, Emission, EngineError,
    EngineLimits, FlowCatalog, HandlerContext, HandlerEmission, ResponseTemplates, TurnState,
};
use crate::domain::flow::{render_with_slots, FlowDefinition, FlowStatus};
use crate::domain::foundation::SlotName;
use crate::domain::progression::{ActionCall, AdvanceResult, StepProgression};
use crate::ports::{ActionError, ActionExecutor, ActionPayload};

/// State and emission produced by one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: TurnState,
    pub emission: Emission,
}

/// Where the internal loop goes after one step.
enum Next {
    /// Keep driving the active flow.
    Continue,
    /// Stop and hand this to the user.
    Suspend(Emission),
}

impl Next {
    fn from_handler(emission: HandlerEmission, pending: &mut Vec<String>) -> Self {
        match emission {
            HandlerEmission::Prompt(text) => Next::Suspend(Emission::Prompt(text)),
            HandlerEmission::Continue { preface } => {
                pending.extend(preface);
                Next::Continue
            }
        }
    }
}

/// Drives one turn from a classified message to the next suspension.
pub struct TurnOrchestrator {
    limits: EngineLimits,
    responses: ResponseTemplates,
    executor: Arc<dyn ActionExecutor>,
}

impl TurnOrchestrator {
    pub fn new(
        limits: EngineLimits,
        responses: ResponseTemplates,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        Self {
            limits,
            responses,
            executor,
        }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub fn responses(&self) -> &ResponseTemplates {
        &self.responses
    }

    /// Runs one turn. Never fails: engine errors roll the state back to its
    /// pre-turn snapshot, move it to `Error` and emit the category's apology.
    pub async fn run_turn(
        &self,
        mut state: TurnState,
        catalog: &FlowCatalog,
        message: ClassifiedMessage,
    ) -> TurnOutcome {
        if state.conversation_state == ConversationState::Error {
            info!(session_id = %state.session_id, "Resetting session after error");
            state.reset();
        }

        let snapshot = state.clone();
        match self.drive(state, catalog, message).await {
            Ok(outcome) => outcome,
            Err(err) => self.fail(snapshot, err),
        }
    }

    async fn drive(
        &self,
        mut state: TurnState,
        catalog: &FlowCatalog,
        message: ClassifiedMessage,
    ) -> Result<TurnOutcome, EngineError> {
        let ctx = HandlerContext::new(catalog, &self.limits, &self.responses);

        if state.conversation_state == ConversationState::Idle {
            state.enter(ConversationState::Understanding);
        }
        if !matches!(
            message,
            ClassifiedMessage::Digression { .. } | ClassifiedMessage::Clarification { .. }
        ) {
            state.digression_depth = 0;
        }

        debug!(
            session_id = %state.session_id,
            pattern = message.pattern(),
            state = ?state.conversation_state,
            "Dispatching classified message"
        );

        let (mut state, emission) = dispatch(&ctx, state, message)?;

        let mut pending = Vec::new();
        let mut next = Next::from_handler(emission, &mut pending);
        let mut chained_actions = 0u32;
        let mut iterations = 0u32;

        let emission = loop {
            if let Next::Suspend(emission) = next {
                break emission;
            }

            iterations += 1;
            if iterations > self.limits.max_turn_iterations {
                return Err(EngineError::TurnIterationsExceeded {
                    limit: self.limits.max_turn_iterations,
                });
            }

            next = match state.conversation_state {
                ConversationState::ReadyForAction => {
                    self.step_ready(&ctx, &mut state, &mut chained_actions, &mut pending)
                        .await?
                }
                ConversationState::Completed => self.complete_active(&ctx, &mut state, &mut pending)?,
                _ => Next::from_handler(patterns::reemit(&ctx, &state, None), &mut pending),
            };
        };

        if state.conversation_state == ConversationState::Understanding {
            state.enter(ConversationState::Idle);
        }
        state.last_error = None;

        let emission = prepend(pending, emission);
        debug!(
            session_id = %state.session_id,
            state = ?state.conversation_state,
            depth = state.flow_stack.depth(),
            terminal = emission.is_terminal(),
            "Turn suspended"
        );

        Ok(TurnOutcome { state, emission })
    }

    /// One internal step in `ReadyForAction`: run the action or emit the
    /// `Say` step under the cursor.
    async fn step_ready(
        &self,
        ctx: &HandlerContext<'_>,
        state: &mut TurnState,
        chained_actions: &mut u32,
        pending: &mut Vec<String>,
    ) -> Result<Next, EngineError> {
        let Some((instance_id, definition)) = active_flow(ctx, state)? else {
            return Ok(Next::from_handler(patterns::idle(ctx, state, None), pending));
        };

        let progression = StepProgression::new(&definition, self.limits.max_advances);
        let need = state
            .active_instance()
            .and_then(|instance| progression.current_need(instance, state.slot_store.get_slots(instance_id)));

        let emission = match need {
            Some(AdvanceResult::NeedsAction(action)) => {
                if *chained_actions >= self.limits.max_chained_actions {
                    info!(
                        session_id = %state.session_id,
                        flow = %definition.name,
                        limit = self.limits.max_chained_actions,
                        "Chained action ceiling reached, suspending"
                    );
                    let prompt = ResponseTemplates::render(
                        &self.responses.still_working,
                        &[("flow", &definition.name.humanized())],
                    );
                    suspend(state, None, prompt)
                } else {
                    *chained_actions += 1;
                    self.execute_action(ctx, state, &definition, action).await?
                }
            }
            Some(AdvanceResult::Say(text)) => {
                pending.push(text);
                advance_active(ctx, state, &definition)?;
                let result = skip_active(ctx, state, &definition)?;
                settle(ctx, state, &definition, result, None)
            }
            Some(other) => settle(ctx, state, &definition, other, None),
            None => {
                let result = skip_active(ctx, state, &definition)?;
                settle(ctx, state, &definition, result, None)
            }
        };

        Ok(Next::from_handler(emission, pending))
    }

    async fn execute_action(
        &self,
        ctx: &HandlerContext<'_>,
        state: &mut TurnState,
        definition: &FlowDefinition,
        action: ActionCall,
    ) -> Result<HandlerEmission, EngineError> {
        let instance_id = state.active_instance_id().ok_or(EngineError::EmptyStack)?;
        let inputs = action.inputs(state.slot_store.get_slots(instance_id));

        state.enter(ConversationState::ExecutingAction);
        info!(
            session_id = %state.session_id,
            flow = %definition.name,
            call = %action.call,
            "Executing action"
        );

        match self.call_with_retries(state, &action.call, &inputs).await {
            Ok(outputs) => {
                for (slot, value) in action.output_slots(&outputs) {
                    state.slot_store.set_slot(instance_id, slot, value);
                }
                if let Some(instance) = state.flow_stack.active_mut() {
                    instance.outputs.extend(outputs);
                }

                advance_active(ctx, state, definition)?;
                let result = skip_active(ctx, state, definition)?;
                Ok(settle(ctx, state, definition, result, None))
            }
            Err(ActionError::Rejected {
                slot: Some(slot),
                reason,
            }) if definition.collect_step_for(&slot).is_some() => {
                Ok(self.reject_slot(ctx, state, definition, slot, reason))
            }
            Err(err) => {
                warn!(
                    session_id = %state.session_id,
                    call = %action.call,
                    error = %err,
                    "Action failed"
                );
                Err(EngineError::ActionFailure {
                    call: action.call,
                    reason: err.to_string(),
                    retryable: err.is_retryable(),
                })
            }
        }
    }

    /// Calls the executor under the action timeout, retrying retryable
    /// failures up to `max_action_retries` extra attempts.
    async fn call_with_retries(
        &self,
        state: &TurnState,
        call: &str,
        inputs: &ActionPayload,
    ) -> Result<ActionPayload, ActionError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = match timeout(self.limits.action_timeout, self.executor.execute(call, inputs)).await {
                Ok(result) => result,
                Err(_) => Err(ActionError::Timeout {
                    timeout_ms: timeout_millis(self.limits.action_timeout),
                }),
            };

            match result {
                Err(err) if err.is_retryable() && attempt <= self.limits.max_action_retries => {
                    warn!(
                        session_id = %state.session_id,
                        call,
                        attempt,
                        error = %err,
                        "Retrying action"
                    );
                }
                other => return other,
            }
        }
    }

    /// The action refused a slot: forget it, rewind to its collect step and
    /// ask again with the reason.
    fn reject_slot(
        &self,
        ctx: &HandlerContext<'_>,
        state: &mut TurnState,
        definition: &FlowDefinition,
        slot: SlotName,
        reason: String,
    ) -> HandlerEmission {
        if let Some(instance_id) = state.active_instance_id() {
            state.slot_store.remove_slot(instance_id, &slot);
        }
        if let (Some(instance), Some((step, _))) =
            (state.flow_stack.active_mut(), definition.collect_step_for(&slot))
        {
            instance.current_step = Some(step);
        }

        info!(
            session_id = %state.session_id,
            flow = %definition.name,
            slot = %slot,
            "Action rejected slot, re-prompting"
        );

        let preface = ResponseTemplates::render(
            &self.responses.invalid_slot,
            &[("slot", &slot.humanized()), ("reason", &reason)],
        );
        settle(ctx, state, definition, AdvanceResult::NeedsCollect(slot), Some(preface))
    }

    /// Pops the finished instance and either ends the conversation or
    /// resumes the parent.
    fn complete_active(
        &self,
        ctx: &HandlerContext<'_>,
        state: &mut TurnState,
        pending: &mut Vec<String>,
    ) -> Result<Next, EngineError> {
        let (_, definition) = active_flow(ctx, state)?.ok_or(EngineError::EmptyStack)?;
        let finished = state.flow_stack.finish_active(FlowStatus::Completed)?;
        let slots = state
            .slot_store
            .remove_instance(finished.instance_id)
            .unwrap_or_default();

        let message = match &definition.completion_message {
            Some(template) => render_with_slots(template, &slots),
            None => ResponseTemplates::render(
                &self.responses.completion,
                &[("flow", &definition.name.humanized())],
            ),
        };

        info!(
            session_id = %state.session_id,
            flow = %definition.name,
            instance_id = %finished.instance_id,
            "Flow completed"
        );

        state.pattern_metadata.clear();

        if state.flow_stack.is_empty() {
            state.waiting_for_slot = None;
            state.active_prompt = None;
            state.enter(ConversationState::Idle);
            return Ok(Next::Suspend(Emission::Terminal(message)));
        }

        let emission = patterns::resume_parent(ctx, state, Some(message))?;
        Ok(Next::from_handler(emission, pending))
    }

    fn fail(&self, mut state: TurnState, err: EngineError) -> TurnOutcome {
        let category = err.category();
        if err.is_configuration_error() {
            error!(
                target: "dialogue_engine::config",
                session_id = %state.session_id,
                error = %err,
                "Flow definition is misconfigured"
            );
        } else {
            warn!(
                session_id = %state.session_id,
                error = %err,
                ?category,
                "Turn failed"
            );
        }

        state.enter(ConversationState::Error);
        state.last_error = Some(category);
        state.pattern_metadata.clear();

        let emission = Emission::Prompt(self.responses.apology(category).to_string());
        TurnOutcome { state, emission }
    }
}

/// The only place a `ClassifiedMessage` is matched on.
fn dispatch(ctx: &HandlerContext<'_>, state: TurnState, message: ClassifiedMessage) -> HandlerResult {
    match message {
        ClassifiedMessage::SlotValue { slots } => slot_value::handle(ctx, state, slots),
        ClassifiedMessage::Correction { slots } => correction::handle(ctx, state, slots),
        ClassifiedMessage::Modification { slots } => modification::handle(ctx, state, slots),
        ClassifiedMessage::Confirmation { value } => confirmation::handle(ctx, state, value),
        ClassifiedMessage::Interruption { target_flow } => interruption::handle(ctx, state, target_flow),
        ClassifiedMessage::Digression { topic } => digression::handle(ctx, state, topic),
        ClassifiedMessage::Clarification { target_slot } => clarification::handle(ctx, state, target_slot),
        ClassifiedMessage::Cancellation => cancellation::handle(ctx, state),
        ClassifiedMessage::Continuation => continuation::handle(ctx, state),
    }
}

/// Puts texts emitted earlier in the turn in front of the final emission.
fn prepend(pending: Vec<String>, emission: Emission) -> Emission {
    if pending.is_empty() {
        return emission;
    }
    let join = |text: &str| join_text(pending.iter().map(String::as_str).chain(std::iter::once(text)));
    match emission {
        Emission::Prompt(text) => Emission::Prompt(join(&text)),
        Emission::Terminal(text) => Emission::Terminal(join(&text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockActionExecutor;
    use crate::domain::dialogue::patterns::fixtures::{booking_at, catalog, state};
    use crate::domain::dialogue::ErrorCategory;
    use crate::domain::flow::{BranchCondition, StepSpec};
    use crate::domain::foundation::StepId;
    use serde_json::json;

    fn orchestrator(executor: Arc<MockActionExecutor>) -> TurnOrchestrator {
        orchestrator_with(EngineLimits::default(), executor)
    }

    fn orchestrator_with(limits: EngineLimits, executor: Arc<MockActionExecutor>) -> TurnOrchestrator {
        TurnOrchestrator::new(limits, ResponseTemplates::default(), executor)
    }

    fn apology(category: ErrorCategory) -> String {
        ResponseTemplates::default().apology(category).to_string()
    }

    fn current_step(state: &TurnState) -> Option<StepId> {
        state.active_instance().and_then(|i| i.current_step)
    }

    mod happy_path {
        use super::*;

        #[tokio::test]
        async fn booking_runs_to_a_terminal_message() {
            let executor = Arc::new(MockActionExecutor::new());
            let engine = orchestrator(executor.clone());
            let catalog = catalog();

            let turn = engine
                .run_turn(state(), &catalog, ClassifiedMessage::interrupt("book_flight"))
                .await;
            assert_eq!(turn.emission, Emission::Prompt("Where are you flying from?".into()));

            let turn = engine
                .run_turn(turn.state, &catalog, ClassifiedMessage::slot_value([("origin", json!("Madrid"))]))
                .await;
            assert_eq!(turn.emission, Emission::Prompt("Where are you flying to?".into()));

            let turn = engine
                .run_turn(
                    turn.state,
                    &catalog,
                    ClassifiedMessage::slot_value([("destination", json!("Barcelona"))]),
                )
                .await;
            assert_eq!(turn.emission, Emission::Prompt("What is the date?".into()));

            let turn = engine
                .run_turn(turn.state, &catalog, ClassifiedMessage::slot_value([("date", json!("tomorrow"))]))
                .await;
            assert_eq!(
                turn.emission,
                Emission::Prompt("Fly Madrid to Barcelona on tomorrow?".into())
            );
            assert_eq!(turn.state.conversation_state, ConversationState::Confirming);
            assert_eq!(executor.call_names(), vec!["search"]);

            let turn = engine
                .run_turn(turn.state, &catalog, ClassifiedMessage::confirm(Some(true)))
                .await;
            assert_eq!(turn.emission, Emission::Terminal("All done with book flight.".into()));
            assert_eq!(executor.call_names(), vec!["search", "book"]);
            assert!(turn.state.flow_stack.is_empty());
            assert_eq!(turn.state.slot_store.instance_count(), 0);
            assert_eq!(turn.state.conversation_state, ConversationState::Idle);
        }

        #[tokio::test]
        async fn action_inputs_carry_instance_slots() {
            let executor = Arc::new(MockActionExecutor::new());
            let engine = orchestrator(executor.clone());
            let state = booking_at(2, &[("origin", "Madrid"), ("destination", "Barcelona")]);

            engine
                .run_turn(state, &catalog(), ClassifiedMessage::slot_value([("date", json!("friday"))]))
                .await;

            let calls = executor.get_calls();
            assert_eq!(calls[0].inputs["origin"], json!("Madrid"));
            assert_eq!(calls[0].inputs["date"], json!("friday"));
        }

        #[tokio::test]
        async fn completing_a_child_resumes_the_parent() {
            let executor = Arc::new(MockActionExecutor::new());
            let engine = orchestrator(executor.clone());
            let catalog = catalog();
            let state = booking_at(1, &[("origin", "Madrid")]);

            let turn = engine
                .run_turn(state, &catalog, ClassifiedMessage::interrupt("check_weather"))
                .await;
            assert_eq!(turn.emission, Emission::Prompt("What is the city?".into()));

            let turn = engine
                .run_turn(turn.state, &catalog, ClassifiedMessage::slot_value([("city", json!("Oslo"))]))
                .await;

            assert_eq!(
                turn.emission,
                Emission::Prompt(
                    "All done with check weather. Back to book flight. Where are you flying to?".into()
                )
            );
            assert_eq!(turn.state.flow_stack.depth(), 1);
            assert_eq!(current_step(&turn.state), Some(StepId::new(1)));
            assert_eq!(turn.state.waiting_for_slot, Some("destination".into()));
        }

        #[tokio::test]
        async fn say_steps_and_outputs_flow_into_the_prompt() {
            let flow = FlowDefinition::new(
                "quote",
                vec![
                    StepSpec::Action {
                        call: "price".into(),
                        input_map: Default::default(),
                        output_map: [("amount".to_string(), "price".into())].into_iter().collect(),
                    },
                    StepSpec::collect("price"),
                    StepSpec::say("That comes to {price}."),
                    StepSpec::collect("email"),
                ],
            )
            .with_completion_message("Sent to {email}.");
            let catalog = FlowCatalog::new().with_flow(flow);
            let executor = Arc::new(MockActionExecutor::new().with_output("price", [("amount", json!(42))]));
            let engine = orchestrator(executor);

            let turn = engine
                .run_turn(state(), &catalog, ClassifiedMessage::interrupt("quote"))
                .await;
            assert_eq!(
                turn.emission,
                Emission::Prompt("That comes to 42. What is the email?".into())
            );
            assert_eq!(turn.state.active_instance().unwrap().outputs["amount"], json!(42));

            let turn = engine
                .run_turn(turn.state, &catalog, ClassifiedMessage::slot_value([("email", json!("a@b.c"))]))
                .await;
            assert_eq!(turn.emission, Emission::Terminal("Sent to a@b.c.".into()));
        }
    }

    mod actions {
        use super::*;

        fn failure(retryable: bool) -> ActionError {
            ActionError::Failed {
                reason: "upstream unavailable".into(),
                retryable,
            }
        }

        #[tokio::test]
        async fn retryable_failures_are_retried() {
            let executor = Arc::new(
                MockActionExecutor::new()
                    .with_error("search", failure(true))
                    .with_error("search", failure(true)),
            );
            let engine = orchestrator(executor.clone());
            let state = booking_at(2, &[("origin", "Madrid"), ("destination", "Barcelona")]);

            let turn = engine
                .run_turn(state, &catalog(), ClassifiedMessage::slot_value([("date", json!("tomorrow"))]))
                .await;

            assert_eq!(executor.call_count(), 3);
            assert_eq!(turn.state.conversation_state, ConversationState::Confirming);
        }

        #[tokio::test]
        async fn exhausted_retries_roll_back_to_error() {
            let executor = Arc::new(
                MockActionExecutor::new()
                    .with_error("search", failure(true))
                    .with_error("search", failure(true))
                    .with_error("search", failure(true)),
            );
            let engine = orchestrator(executor.clone());
            let before = booking_at(2, &[("origin", "Madrid"), ("destination", "Barcelona")]);

            let turn = engine
                .run_turn(
                    before.clone(),
                    &catalog(),
                    ClassifiedMessage::slot_value([("date", json!("tomorrow"))]),
                )
                .await;

            assert_eq!(executor.call_count(), 3);
            assert_eq!(turn.emission, Emission::Prompt(apology(ErrorCategory::ActionFailure)));
            assert_eq!(turn.state.conversation_state, ConversationState::Error);
            assert_eq!(turn.state.last_error, Some(ErrorCategory::ActionFailure));
            assert_eq!(turn.state.flow_stack, before.flow_stack);
            assert_eq!(turn.state.slot_store, before.slot_store);
        }

        #[tokio::test]
        async fn non_retryable_failure_is_not_retried() {
            let executor = Arc::new(MockActionExecutor::new().with_error("search", failure(false)));
            let engine = orchestrator(executor.clone());
            let state = booking_at(2, &[("origin", "Madrid"), ("destination", "Barcelona")]);

            let turn = engine
                .run_turn(state, &catalog(), ClassifiedMessage::slot_value([("date", json!("tomorrow"))]))
                .await;

            assert_eq!(executor.call_count(), 1);
            assert_eq!(turn.state.conversation_state, ConversationState::Error);
        }

        #[tokio::test]
        async fn slow_actions_time_out() {
            let executor = Arc::new(MockActionExecutor::new().with_delay(std::time::Duration::from_millis(200)));
            let limits = EngineLimits {
                action_timeout: std::time::Duration::from_millis(10),
                max_action_retries: 0,
                ..EngineLimits::default()
            };
            let engine = orchestrator_with(limits, executor);
            let state = booking_at(2, &[("origin", "Madrid"), ("destination", "Barcelona")]);

            let turn = engine
                .run_turn(state, &catalog(), ClassifiedMessage::slot_value([("date", json!("tomorrow"))]))
                .await;

            assert_eq!(turn.state.last_error, Some(ErrorCategory::ActionFailure));
        }

        #[tokio::test]
        async fn rejected_slot_is_asked_again() {
            let executor = Arc::new(MockActionExecutor::new().with_error(
                "search",
                ActionError::Rejected {
                    slot: Some("origin".into()),
                    reason: "no flights leave from there".into(),
                },
            ));
            let engine = orchestrator(executor);
            let state = booking_at(2, &[("origin", "Atlantis"), ("destination", "Barcelona")]);

            let turn = engine
                .run_turn(state, &catalog(), ClassifiedMessage::slot_value([("date", json!("tomorrow"))]))
                .await;

            assert_eq!(
                turn.emission,
                Emission::Prompt(
                    "That origin won't work: no flights leave from there. Where are you flying from?"
                        .into()
                )
            );
            assert_eq!(current_step(&turn.state), Some(StepId::FIRST));
            assert_eq!(turn.state.waiting_for_slot, Some("origin".into()));
            let slots = turn.state.active_slots();
            assert!(!slots.contains_key(&SlotName::from("origin")));
            assert_eq!(slots[&SlotName::from("date")], json!("tomorrow"));
        }

        #[tokio::test]
        async fn rejection_without_slot_is_a_failure() {
            let executor = Arc::new(MockActionExecutor::new().with_error(
                "search",
                ActionError::Rejected {
                    slot: None,
                    reason: "bad request".into(),
                },
            ));
            let engine = orchestrator(executor);
            let state = booking_at(2, &[("origin", "Madrid"), ("destination", "Barcelona")]);

            let turn = engine
                .run_turn(state, &catalog(), ClassifiedMessage::slot_value([("date", json!("tomorrow"))]))
                .await;

            assert_eq!(turn.state.last_error, Some(ErrorCategory::ActionFailure));
        }

        #[tokio::test]
        async fn chained_action_ceiling_suspends_until_next_message() {
            let flow = FlowDefinition::new(
                "pipeline",
                vec![StepSpec::action("a"), StepSpec::action("b"), StepSpec::collect("done")],
            );
            let catalog = FlowCatalog::new().with_flow(flow);
            let executor = Arc::new(MockActionExecutor::new());
            let limits = EngineLimits {
                max_chained_actions: 1,
                ..EngineLimits::default()
            };
            let engine = orchestrator_with(limits, executor.clone());

            let turn = engine
                .run_turn(state(), &catalog, ClassifiedMessage::interrupt("pipeline"))
                .await;
            assert_eq!(
                turn.emission,
                Emission::Prompt("Still working on pipeline. Let me know when to carry on.".into())
            );
            assert_eq!(turn.state.conversation_state, ConversationState::ReadyForAction);
            assert_eq!(executor.call_names(), vec!["a"]);

            let turn = engine
                .run_turn(turn.state, &catalog, ClassifiedMessage::Continuation)
                .await;
            assert_eq!(turn.emission, Emission::Prompt("What is the done?".into()));
            assert_eq!(executor.call_names(), vec!["a", "b"]);
        }
    }

    mod errors {
        use super::*;

        #[tokio::test]
        async fn cyclic_flow_is_reported_as_misconfigured() {
            let flow = FlowDefinition::new(
                "loop",
                vec![StepSpec::branch(
                    BranchCondition::SlotAbsent { slot: "x".into() },
                    StepId::FIRST,
                )],
            );
            let catalog = FlowCatalog::new().with_flow(flow);
            let engine = orchestrator(Arc::new(MockActionExecutor::new()));

            let turn = engine
                .run_turn(state(), &catalog, ClassifiedMessage::interrupt("loop"))
                .await;

            assert_eq!(turn.emission, Emission::Prompt(apology(ErrorCategory::MisconfiguredFlow)));
            assert_eq!(turn.state.conversation_state, ConversationState::Error);
            assert!(turn.state.flow_stack.is_empty());
        }

        #[tokio::test]
        async fn stack_depth_error_keeps_existing_tasks() {
            let engine = orchestrator_with(
                EngineLimits {
                    max_stack_depth: 1,
                    ..EngineLimits::default()
                },
                Arc::new(MockActionExecutor::new()),
            );
            let mut before = booking_at(1, &[("origin", "Madrid")]);
            before.flow_stack.set_max_depth(1);

            let turn = engine
                .run_turn(before.clone(), &catalog(), ClassifiedMessage::interrupt("check_weather"))
                .await;

            assert_eq!(turn.emission, Emission::Prompt(apology(ErrorCategory::StackDepth)));
            assert_eq!(turn.state.flow_stack, before.flow_stack);
            assert_eq!(turn.state.conversation_state, ConversationState::Error);
        }

        #[tokio::test]
        async fn turn_after_error_starts_fresh() {
            let engine = orchestrator(Arc::new(MockActionExecutor::new()));
            let mut state = booking_at(1, &[("origin", "Madrid")]);
            state.conversation_state = ConversationState::Error;
            state.last_error = Some(ErrorCategory::StackDepth);

            let turn = engine
                .run_turn(state, &catalog(), ClassifiedMessage::Continuation)
                .await;

            assert_eq!(turn.emission, Emission::Prompt("What can I help you with?".into()));
            assert!(turn.state.flow_stack.is_empty());
            assert_eq!(turn.state.slot_store.instance_count(), 0);
            assert_eq!(turn.state.conversation_state, ConversationState::Idle);
            assert_eq!(turn.state.last_error, None);
        }

        #[tokio::test]
        async fn third_unclear_confirmation_errors_and_resets_counter() {
            let engine = orchestrator(Arc::new(MockActionExecutor::new()));
            let catalog = catalog();
            let mut state = booking_at(
                4,
                &[("origin", "Madrid"), ("destination", "Barcelona"), ("date", "tomorrow")],
            );

            for retry in 1..=2u8 {
                let turn = engine
                    .run_turn(state, &catalog, ClassifiedMessage::confirm(None))
                    .await;
                assert_eq!(turn.state.conversation_state, ConversationState::Confirming);
                assert_eq!(turn.state.pattern_metadata.confirmation_retries(), retry);
                state = turn.state;
            }

            let turn = engine
                .run_turn(state, &catalog, ClassifiedMessage::confirm(None))
                .await;

            assert_eq!(
                turn.emission,
                Emission::Prompt(apology(ErrorCategory::ConfirmationExhausted))
            );
            assert_eq!(turn.state.conversation_state, ConversationState::Error);
            assert_eq!(turn.state.pattern_metadata.confirmation_retries(), 0);
        }
    }

    #[tokio::test]
    async fn digression_in_idle_returns_to_idle() {
        let engine = orchestrator(Arc::new(MockActionExecutor::new()));

        let turn = engine
            .run_turn(
                state(),
                &catalog(),
                ClassifiedMessage::Digression {
                    topic: "opening hours".into(),
                },
            )
            .await;

        assert_eq!(turn.state.conversation_state, ConversationState::Idle);
        assert!(turn.emission.text().ends_with("What can I help you with?"));
    }

    #[tokio::test]
    async fn non_digression_resets_digression_depth() {
        let engine = orchestrator(Arc::new(MockActionExecutor::new()));
        let mut state = booking_at(1, &[("origin", "Madrid")]);
        state.digression_depth = 3;

        let turn = engine
            .run_turn(state, &catalog(), ClassifiedMessage::Continuation)
            .await;

        assert_eq!(turn.state.digression_depth, 0);
    }
}
