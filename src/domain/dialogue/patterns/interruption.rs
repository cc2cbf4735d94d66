//! Interruption - the user starts another task on top of the current one.

use tracing::info;

use super::{idle, reemit, settle, skip_active, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::responses::ResponseTemplates;
use crate::domain::dialogue::turn_state::TurnState;
use crate::domain::foundation::FlowName;

/// Pushes a new instance of `target_flow`, pausing the current one, and
/// prompts for the new flow's first unmet need.
///
/// An unknown target is answered with an apology and changes nothing.
pub fn handle(ctx: &HandlerContext<'_>, mut state: TurnState, target_flow: FlowName) -> HandlerResult {
    let Some(definition) = ctx.catalog.get(&target_flow) else {
        let apology = ResponseTemplates::render(
            &ctx.responses.apologies.unknown_flow,
            &[("flow", &target_flow.humanized())],
        );
        let emission = if state.flow_stack.is_empty() {
            idle(ctx, &mut state, Some(apology))
        } else {
            reemit(ctx, &state, Some(apology))
        };
        return Ok((state, emission));
    };

    let instance_id = state.flow_stack.push(target_flow.clone(), None)?;
    info!(
        session_id = %state.session_id,
        flow = %target_flow,
        instance_id = %instance_id,
        depth = state.flow_stack.depth(),
        "Flow started"
    );

    state.pattern_metadata.clear();
    state.waiting_for_slot = None;

    let result = skip_active(ctx, &mut state, &definition)?;
    let emission = settle(ctx, &mut state, &definition, result, None);
    Ok((state, emission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::emission::HandlerEmission;
    use crate::domain::dialogue::errors::EngineError;
    use crate::domain::dialogue::limits::EngineLimits;
    use crate::domain::dialogue::patterns::fixtures::*;
    use crate::domain::dialogue::state::ConversationState;
    use crate::domain::flow::FlowStatus;
    use crate::domain::foundation::StepId;

    fn run(state: TurnState, target: &str, limits: EngineLimits) -> HandlerResult {
        let catalog = catalog();
        let responses = ResponseTemplates::default();
        let ctx = HandlerContext::new(&catalog, &limits, &responses);
        handle(&ctx, state, target.into())
    }

    #[test]
    fn starts_flow_from_idle() {
        let (state, emission) = run(state(), "book_flight", EngineLimits::default()).unwrap();

        assert_eq!(emission, HandlerEmission::Prompt("Where are you flying from?".into()));
        assert_eq!(state.conversation_state, ConversationState::WaitingForSlot);
        assert_eq!(state.flow_stack.depth(), 1);
    }

    #[test]
    fn pauses_current_flow() {
        let before = booking_at(1, &[("origin", "Madrid")]);
        let parent = before.active_instance_id().unwrap();

        let (state, emission) = run(before, "check_weather", EngineLimits::default()).unwrap();

        assert_eq!(emission, HandlerEmission::Prompt("What is the city?".into()));
        assert_eq!(state.flow_stack.depth(), 2);
        let paused = state.flow_stack.get(parent).unwrap();
        assert_eq!(paused.status, FlowStatus::Paused);
        assert_eq!(paused.current_step, Some(StepId::new(1)));
        assert_eq!(state.waiting_for_slot, Some("city".into()));
    }

    #[test]
    fn same_flow_twice_gets_fresh_slots() {
        let before = booking_at(1, &[("origin", "Madrid")]);

        let (state, emission) = run(before, "book_flight", EngineLimits::default()).unwrap();

        assert_eq!(emission, HandlerEmission::Prompt("Where are you flying from?".into()));
        assert_eq!(state.flow_stack.depth(), 2);
        assert!(state.active_slots().is_empty());
    }

    #[test]
    fn depth_limit_is_an_error() {
        let limits = EngineLimits {
            max_stack_depth: 1,
            ..EngineLimits::default()
        };
        let mut before = booking_at(1, &[]);
        before.apply_limits(&limits);

        let err = run(before, "check_weather", limits).unwrap_err();

        assert_eq!(err, EngineError::StackDepthExceeded { limit: 1 });
    }

    #[test]
    fn unknown_flow_changes_nothing() {
        let before = booking_at(1, &[("origin", "Madrid")]);

        let (after, emission) = run(before.clone(), "rent_car", EngineLimits::default()).unwrap();

        assert_eq!(after, before);
        assert_eq!(
            emission,
            HandlerEmission::Prompt("Sorry, I can't help with rent car yet. Where are you flying to?".into())
        );
    }
}
