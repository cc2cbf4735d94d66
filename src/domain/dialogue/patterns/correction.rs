//! Correction - the user fixes a value given earlier.
//!
//! Rewrites the named slots and nothing else: the cursor and the
//! conversation state stay exactly where they were, and the prompt that was
//! active before the message is emitted again.

use super::{active_flow, describe_slots, idle, reemit, suspend, write_slots, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::emission::HandlerEmission;
use crate::domain::dialogue::metadata::{CorrectionMeta, PatternMeta};
use crate::domain::dialogue::responses::ResponseTemplates;
use crate::domain::dialogue::state::ConversationState;
use crate::domain::dialogue::turn_state::TurnState;
use crate::domain::flow::{render_with_slots, SlotValue, StepSpec};
use crate::domain::foundation::SlotName;
use crate::domain::progression::StepProgression;

pub fn handle(
    ctx: &HandlerContext<'_>,
    state: TurnState,
    slots: Vec<(SlotName, SlotValue)>,
) -> HandlerResult {
    rewrite_slots(ctx, state, slots, |slots| {
        PatternMeta::Correction(CorrectionMeta { slots })
    })
}

/// Shared by Correction and Modification; only the metadata they record
/// differs.
pub(super) fn rewrite_slots<F>(
    ctx: &HandlerContext<'_>,
    mut state: TurnState,
    slots: Vec<(SlotName, SlotValue)>,
    meta: F,
) -> HandlerResult
where
    F: FnOnce(Vec<SlotName>) -> PatternMeta,
{
    let Some((instance_id, definition)) = active_flow(ctx, &state)? else {
        let emission = idle(ctx, &mut state, None);
        return Ok((state, emission));
    };

    let previous = state.conversation_state;
    state.enter(ConversationState::ValidatingSlot);
    let outcome = write_slots(ctx, &mut state, &definition, slots);
    state.conversation_state = previous;

    let preface = match outcome.rejection {
        Some(rejection) => Some(rejection),
        None if outcome.written.is_empty() => None,
        None => Some(ResponseTemplates::render(
            &ctx.responses.corrected,
            &[("slots", &describe_slots(&outcome.written))],
        )),
    };
    state
        .pattern_metadata
        .set(meta(outcome.written.into_iter().map(|(name, _)| name).collect()));

    // A pending confirmation is re-rendered so it shows the new values.
    let confirm_template = match (previous, state.active_instance()) {
        (ConversationState::Confirming, Some(instance)) => {
            match StepProgression::new(&definition, ctx.limits.max_advances).current_step(instance) {
                Some((_, StepSpec::Confirm { message_template })) => Some(message_template.clone()),
                _ => None,
            }
        }
        _ => None,
    };

    let emission: HandlerEmission = match confirm_template {
        Some(template) => {
            let text = render_with_slots(&template, state.slot_store.get_slots(instance_id));
            suspend(&mut state, preface, text)
        }
        None => reemit(ctx, &state, preface),
    };
    Ok((state, emission))
}
