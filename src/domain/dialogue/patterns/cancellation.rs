//! Cancellation - abandon the active task.

use tracing::info;

use super::{idle, resume_parent, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::errors::ErrorCategory;
use crate::domain::dialogue::responses::ResponseTemplates;
use crate::domain::dialogue::turn_state::TurnState;
use crate::domain::flow::FlowStatus;

/// Pops exactly one instance and drops its slots. The parent, if any,
/// resumes at the cursor it had when it was paused.
pub fn handle(ctx: &HandlerContext<'_>, mut state: TurnState) -> HandlerResult {
    if state.flow_stack.is_empty() {
        let preface = ctx.responses.apology(ErrorCategory::NothingToCancel).to_string();
        let emission = idle(ctx, &mut state, Some(preface));
        return Ok((state, emission));
    }

    let cancelled = state.flow_stack.finish_active(FlowStatus::Cancelled)?;
    state.slot_store.remove_instance(cancelled.instance_id);
    state.pattern_metadata.clear();
    state.waiting_for_slot = None;
    state.digression_depth = 0;

    info!(
        session_id = %state.session_id,
        flow = %cancelled.definition_name,
        instance_id = %cancelled.instance_id,
        "Flow cancelled"
    );

    let preface = ResponseTemplates::render(
        &ctx.responses.cancelled,
        &[("flow", &cancelled.definition_name.humanized())],
    );

    let emission = if state.flow_stack.is_empty() {
        idle(ctx, &mut state, Some(preface))
    } else {
        resume_parent(ctx, &mut state, Some(preface))?
    };
    Ok((state, emission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::emission::HandlerEmission;
    use crate::domain::dialogue::limits::EngineLimits;
    use crate::domain::dialogue::patterns::fixtures::*;
    use crate::domain::dialogue::state::ConversationState;
    use crate::domain::flow::FlowStatus;
    use crate::domain::foundation::StepId;

    fn run(state: TurnState) -> (TurnState, HandlerEmission) {
        let catalog = catalog();
        let limits = EngineLimits::default();
        let responses = ResponseTemplates::default();
        let ctx = HandlerContext::new(&catalog, &limits, &responses);
        handle(&ctx, state).unwrap()
    }

    #[test]
    fn cancelling_only_flow_goes_idle() {
        let (state, emission) = run(booking_at(1, &[("origin", "Madrid")]));

        assert!(state.flow_stack.is_empty());
        assert_eq!(state.slot_store.instance_count(), 0);
        assert_eq!(state.conversation_state, ConversationState::Idle);
        assert_eq!(
            emission,
            HandlerEmission::Prompt("Okay, I've cancelled book flight. What can I help you with?".into())
        );
    }

    #[test]
    fn parent_resumes_at_its_cursor() {
        let mut state = booking_at(2, &[("origin", "Madrid"), ("destination", "Rome")]);
        let parent = state.active_instance_id().unwrap();
        let child = state.flow_stack.push("check_weather".into(), Some(StepId::FIRST)).unwrap();
        state.slot_store.set_slot(child, "city".into(), serde_json::json!("Rome"));

        let (state, emission) = run(state);

        assert_eq!(state.flow_stack.depth(), 1);
        let active = state.active_instance().unwrap();
        assert_eq!(active.instance_id, parent);
        assert_eq!(active.status, FlowStatus::Active);
        assert_eq!(active.current_step, Some(StepId::new(2)));
        assert_eq!(state.slot_store.get_slots(child).len(), 0);
        assert_eq!(state.waiting_for_slot, Some("date".into()));
        assert_eq!(
            emission,
            HandlerEmission::Prompt(
                "Okay, I've cancelled check weather. Back to book flight. What is the date?".into()
            )
        );
    }

    #[test]
    fn pops_exactly_one_of_three() {
        let mut state = booking_at(0, &[]);
        state.flow_stack.push("check_weather".into(), Some(StepId::FIRST)).unwrap();
        state.flow_stack.push("check_weather".into(), Some(StepId::FIRST)).unwrap();

        let (state, _) = run(state);

        assert_eq!(state.flow_stack.depth(), 2);
        assert_eq!(state.active_instance().unwrap().definition_name.as_str(), "check_weather");
    }

    #[test]
    fn nothing_to_cancel() {
        let (state, emission) = run(state());

        assert_eq!(state.conversation_state, ConversationState::Idle);
        assert_eq!(
            emission,
            HandlerEmission::Prompt("There's nothing to cancel right now. What can I help you with?".into())
        );
    }
}
