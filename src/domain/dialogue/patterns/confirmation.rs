//! Confirmation - yes, no, or unclear in answer to a `Confirm` step.

use tracing::warn;

use super::{active_flow, advance_active, continuation, idle, reemit, settle, skip_active, HandlerResult};
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::emission::HandlerEmission;
use crate::domain::dialogue::errors::EngineError;
use crate::domain::dialogue::metadata::{ConfirmationMeta, PatternMeta};
use crate::domain::dialogue::state::ConversationState;
use crate::domain::dialogue::turn_state::TurnState;

/// - `Some(true)`: moves past the confirm step.
/// - `Some(false)`: stays on the confirm step and invites a modification.
/// - `None`: asks again, failing the turn once the retry limit is reached.
///
/// Outside a pending confirmation the answer carries no information and is
/// treated as a continuation.
pub fn handle(ctx: &HandlerContext<'_>, mut state: TurnState, value: Option<bool>) -> HandlerResult {
    let Some((_, definition)) = active_flow(ctx, &state)? else {
        let emission = idle(ctx, &mut state, None);
        return Ok((state, emission));
    };

    if state.conversation_state != ConversationState::Confirming {
        return continuation::handle(ctx, state);
    }

    match value {
        Some(true) => {
            state.pattern_metadata.clear();
            advance_active(ctx, &mut state, &definition)?;
            let result = skip_active(ctx, &mut state, &definition)?;
            let emission = settle(ctx, &mut state, &definition, result, None);
            Ok((state, emission))
        }
        Some(false) => {
            state.pattern_metadata.set(PatternMeta::Confirmation(ConfirmationMeta {
                retries: 0,
                declined: true,
            }));
            state.enter(ConversationState::Confirming);
            let emission = HandlerEmission::Prompt(ctx.responses.confirmation_declined.clone());
            Ok((state, emission))
        }
        None => {
            let retries = state.pattern_metadata.confirmation_retries().saturating_add(1);
            if retries >= ctx.limits.max_confirmation_retries {
                warn!(
                    session_id = %state.session_id,
                    flow = %definition.name,
                    attempts = retries,
                    "Confirmation retries exhausted"
                );
                return Err(EngineError::ConfirmationRetriesExhausted { attempts: retries });
            }

            state.pattern_metadata.set(PatternMeta::Confirmation(ConfirmationMeta {
                retries,
                declined: false,
            }));
            state.enter(ConversationState::Confirming);
            let emission = reemit(ctx, &state, Some(ctx.responses.confirmation_retry.clone()));
            Ok((state, emission))
        }
    }
}
