//! SlotValue - the user supplies one or more slot values.

use super::{active_flow, idle, settle, skip_active, write_slots, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::state::ConversationState;
use crate::domain::dialogue::turn_state::TurnState;
use crate::domain::flow::SlotValue;
use crate::domain::foundation::SlotName;

/// Writes every valid value, then skips all steps the new values satisfy.
/// Invalid values are reported and the same step is asked again.
pub fn handle(
    ctx: &HandlerContext<'_>,
    mut state: TurnState,
    slots: Vec<(SlotName, SlotValue)>,
) -> HandlerResult {
    let Some((_, definition)) = active_flow(ctx, &state)? else {
        let emission = idle(ctx, &mut state, None);
        return Ok((state, emission));
    };

    state.enter(ConversationState::ValidatingSlot);
    let outcome = write_slots(ctx, &mut state, &definition, slots);
    state.pattern_metadata.clear();

    let result = skip_active(ctx, &mut state, &definition)?;
    let emission = settle(ctx, &mut state, &definition, result, outcome.rejection);
    Ok((state, emission))
}
