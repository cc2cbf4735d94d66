//! Digression - a side question.
//!
//! Answers the topic and repeats the exact prompt that was active. The flow
//! stack, the cursor, `waiting_for_slot` and the conversation state are
//! left alone; only `digression_depth` moves.

use super::{reemit, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::emission::join_text;
use crate::domain::dialogue::responses::ResponseTemplates;
use crate::domain::dialogue::turn_state::TurnState;

pub fn handle(ctx: &HandlerContext<'_>, mut state: TurnState, topic: String) -> HandlerResult {
    let answer = ctx.responses.digression_answer(&topic);

    let max = ctx.limits.max_digression_depth;
    state.digression_depth = state.digression_depth.saturating_add(1).min(max);

    let nudge = match state.active_instance() {
        Some(instance) if state.digression_depth >= max => Some(ResponseTemplates::render(
            &ctx.responses.digression_limit,
            &[("flow", &instance.definition_name.humanized())],
        )),
        _ => None,
    };

    let preface = join_text([Some(answer), nudge].into_iter().flatten());
    let emission = reemit(ctx, &state, Some(preface));
    Ok((state, emission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::emission::HandlerEmission;
    use crate::domain::dialogue::limits::EngineLimits;
    use crate::domain::dialogue::patterns::fixtures::*;

    fn run(state: TurnState, topic: &str) -> (TurnState, HandlerEmission) {
        let catalog = catalog();
        let limits = EngineLimits::default();
        let mut responses = ResponseTemplates::default();
        responses.digression_answers.insert(
            "what airports do you support?".into(),
            "We support all major airports.".into(),
        );
        let ctx = HandlerContext::new(&catalog, &limits, &responses);
        handle(&ctx, state, topic.to_string()).unwrap()
    }

    #[test]
    fn answers_and_reemits_exact_prompt() {
        let before = booking_at(1, &[("origin", "Madrid")]);

        let (after, emission) = run(before.clone(), "What airports do you support?");

        assert_eq!(
            emission,
            HandlerEmission::Prompt("We support all major airports. Where are you flying to?".into())
        );
        assert_eq!(after.flow_stack, before.flow_stack);
        assert_eq!(after.waiting_for_slot, before.waiting_for_slot);
        assert_eq!(after.conversation_state, before.conversation_state);
        assert_eq!(after.active_prompt, before.active_prompt);
        assert_eq!(after.digression_depth, 1);
    }

    #[test]
    fn depth_is_capped_with_a_nudge() {
        let mut state = booking_at(1, &[]);
        for _ in 0..5 {
            state = run(state, "baggage").0;
        }
        assert_eq!(state.digression_depth, 3);

        let (_, emission) = run(state, "baggage");

        assert_eq!(
            emission,
            HandlerEmission::Prompt(
                "I don't have an answer about baggage right now. Let's get back to book flight. Where are you flying to?"
                    .into()
            )
        );
    }

    #[test]
    fn idle_digression_reemits_idle_prompt() {
        let (state, emission) = run(state(), "baggage");

        assert_eq!(
            emission,
            HandlerEmission::Prompt(
                "I don't have an answer about baggage right now. What can I help you with?".into()
            )
        );
        assert!(state.flow_stack.is_empty());
    }
}
