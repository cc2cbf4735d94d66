//! Clarification - the user asks why something is needed.

use super::{active_flow, reemit, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::responses::ResponseTemplates;
use crate::domain::dialogue::turn_state::TurnState;
use crate::domain::flow::StepSpec;
use crate::domain::foundation::SlotName;

/// Explains the slot being asked for (or `target_slot` if given) and
/// repeats the same prompt. Nothing else changes.
pub fn handle(
    ctx: &HandlerContext<'_>,
    state: TurnState,
    target_slot: Option<SlotName>,
) -> HandlerResult {
    let Some((_, definition)) = active_flow(ctx, &state)? else {
        let emission = reemit(ctx, &state, Some(ctx.responses.no_active_task.clone()));
        return Ok((state, emission));
    };

    let flow = definition.name.humanized();
    let slot = target_slot.or_else(|| state.waiting_for_slot.clone());

    let explanation = match slot.as_ref().and_then(|s| definition.collect_step_for(s)) {
        Some((
            _,
            StepSpec::Collect {
                description: Some(description),
                ..
            },
        )) => description.clone(),
        Some((_, step)) => ResponseTemplates::render(
            &ctx.responses.clarification,
            &[
                ("slot", &step.collected_slot().map(SlotName::humanized).unwrap_or_default()),
                ("flow", &flow),
            ],
        ),
        None => ResponseTemplates::render(&ctx.responses.clarification_general, &[("flow", &flow)]),
    };

    let emission = reemit(ctx, &state, Some(explanation));
    Ok((state, emission))
}
