//! Continuation - nothing new, carry on from where the flow stands.

use super::{active_flow, idle, settle, skip_active, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::turn_state::TurnState;

pub fn handle(ctx: &HandlerContext<'_>, mut state: TurnState) -> HandlerResult {
    let Some((_, definition)) = active_flow(ctx, &state)? else {
        let emission = idle(ctx, &mut state, None);
        return Ok((state, emission));
    };

    let result = skip_active(ctx, &mut state, &definition)?;
    let emission = settle(ctx, &mut state, &definition, result, None);
    Ok((state, emission))
}
