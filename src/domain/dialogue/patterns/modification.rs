//! Modification - the user deliberately changes a value, typically after
//! declining a confirmation. Same effect as a correction; only the
//! metadata record differs.

use super::correction::rewrite_slots;
use super::HandlerResult;
use crate::domain::dialogue::catalog::HandlerContext;
use crate::domain::dialogue::metadata::{ModificationMeta, PatternMeta};
use crate::domain::dialogue::turn_state::TurnState;
use crate::domain::flow::SlotValue;
use crate::domain::foundation::SlotName;

pub fn handle(
    ctx: &HandlerContext<'_>,
    state: TurnState,
    slots: Vec<(SlotName, SlotValue)>,
) -> HandlerResult {
    rewrite_slots(ctx, state, slots, |slots| {
        PatternMeta::Modification(ModificationMeta { slots })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::emission::HandlerEmission;
    use crate::domain::dialogue::limits::EngineLimits;
    use crate::domain::dialogue::metadata::{ConfirmationMeta, CorrectionMeta};
    use crate::domain::dialogue::patterns::fixtures::*;
    use crate::domain::dialogue::responses::ResponseTemplates;
    use crate::domain::dialogue::state::ConversationState;
    use serde_json::json;

    #[test]
    fn modification_after_decline_reasks_confirmation() {
        let catalog = catalog();
        let limits = EngineLimits::default();
        let responses = ResponseTemplates::default();
        let ctx = HandlerContext::new(&catalog, &limits, &responses);
        let mut state = booking_at(
            4,
            &[("origin", "Madrid"), ("destination", "Barcelona"), ("date", "tomorrow")],
        );
        state.pattern_metadata.set(PatternMeta::Confirmation(ConfirmationMeta {
            retries: 0,
            declined: true,
        }));

        let (state, emission) =
            handle(&ctx, state, vec![("destination".into(), json!("Valencia"))]).unwrap();

        assert!(state.pattern_metadata.confirmation().is_none());
        assert!(state.pattern_metadata.modification().is_some());
        assert_eq!(state.conversation_state, ConversationState::Confirming);
        assert_eq!(
            emission,
            HandlerEmission::Prompt(
                "Got it, I've updated destination to Valencia. Fly Madrid to Valencia on tomorrow?".into()
            )
        );
    }

    #[test]
    fn modification_replaces_correction_meta() {
        let catalog = catalog();
        let limits = EngineLimits::default();
        let responses = ResponseTemplates::default();
        let ctx = HandlerContext::new(&catalog, &limits, &responses);
        let mut state = booking_at(1, &[("origin", "Chicago")]);
        state
            .pattern_metadata
            .set(PatternMeta::Correction(CorrectionMeta::default()));

        let (state, _) = handle(&ctx, state, vec![("origin".into(), json!("Boston"))]).unwrap();

        assert!(state.pattern_metadata.correction().is_none());
        assert_eq!(
            state.pattern_metadata.modification().unwrap().slots,
            vec![SlotName::from("origin")]
        );
    }
}
