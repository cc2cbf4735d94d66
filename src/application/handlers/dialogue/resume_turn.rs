//! Human Input Gate - the one place a conversation waits for the user.
//!
//! `resume` loads the session's last checkpoint, classifies the utterance,
//! runs one turn through the orchestrator and checkpoints the result. Between
//! calls the session holds nothing but its checkpoint.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::orchestrator::TurnOrchestrator;
use crate::domain::dialogue::{
    join_text, timeout_millis, ClassifiedMessage, Emission, ErrorCategory, FlowCatalog, TurnState,
};
use crate::domain::flow::FlowDefinition;
use crate::domain::foundation::{FlowName, SessionId};
use crate::ports::{
    CheckpointError, CheckpointStore, ClassificationContext, Classifier, ClassifierError,
    FlowDefinitionError, FlowDefinitionProvider,
};

/// Errors that stop a turn before it produces an emission. Engine errors
/// never show up here; they become apologies.
#[derive(Debug, Clone, Error)]
pub enum GateError {
    #[error("Classifier error: {0}")]
    Classification(#[from] ClassifierError),

    #[error("Flow definition provider error: {0}")]
    FlowProvider(#[from] FlowDefinitionError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Handler for resuming a session with the user's next input.
pub struct HumanInputGate {
    classifier: Arc<dyn Classifier>,
    flows: Arc<dyn FlowDefinitionProvider>,
    checkpoints: Arc<dyn CheckpointStore>,
    orchestrator: TurnOrchestrator,
}

impl HumanInputGate {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        flows: Arc<dyn FlowDefinitionProvider>,
        checkpoints: Arc<dyn CheckpointStore>,
        orchestrator: TurnOrchestrator,
    ) -> Self {
        Self {
            classifier,
            flows,
            checkpoints,
            orchestrator,
        }
    }

    /// Classifies `utterance` and runs one turn for the session.
    ///
    /// A classifier timeout is answered with an apology and the pending
    /// prompt; the session's checkpoint is left untouched.
    ///
    /// # Errors
    ///
    /// Fails only when a collaborator fails outright (classifier, flow
    /// provider, or checkpoint store).
    pub async fn resume(&self, session_id: SessionId, utterance: &str) -> Result<Emission, GateError> {
        let state = self.load(session_id).await?;
        let context = self.classification_context(&state).await?;

        let limit = self.orchestrator.limits().classifier_timeout;
        let classified = match timeout(limit, self.classifier.classify(utterance, &context)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout {
                timeout_ms: timeout_millis(limit),
            }),
        };

        let message = match classified {
            Ok(message) => message,
            Err(ClassifierError::Timeout { timeout_ms }) => {
                warn!(%session_id, timeout_ms, "Classifier timed out");
                return Ok(self.timeout_emission(&state));
            }
            Err(err) => return Err(err.into()),
        };

        self.run(state, message).await
    }

    /// Runs one turn for an already classified message.
    ///
    /// # Errors
    ///
    /// Same as [`HumanInputGate::resume`], minus classification.
    pub async fn resume_classified(
        &self,
        session_id: SessionId,
        message: ClassifiedMessage,
    ) -> Result<Emission, GateError> {
        let state = self.load(session_id).await?;
        self.run(state, message).await
    }

    async fn run(&self, state: TurnState, message: ClassifiedMessage) -> Result<Emission, GateError> {
        let session_id = state.session_id;
        let turn = state.turn_count + 1;
        info!(%session_id, turn, pattern = message.pattern(), "Turn started");

        let catalog = self.catalog_for(&state, &message).await?;
        let outcome = self.orchestrator.run_turn(state, &catalog, message).await;

        let mut state = outcome.state;
        state.turn_count = turn;
        state.updated_at = Utc::now();
        self.checkpoints.save(session_id, &state).await?;

        info!(
            %session_id,
            turn,
            state = ?state.conversation_state,
            depth = state.flow_stack.depth(),
            "Turn checkpointed"
        );

        Ok(outcome.emission)
    }

    async fn load(&self, session_id: SessionId) -> Result<TurnState, GateError> {
        let limits = self.orchestrator.limits();
        let state = match self.checkpoints.load(session_id).await? {
            Some(mut state) => {
                state.apply_limits(limits);
                state
            }
            None => {
                debug!(%session_id, "No checkpoint, starting new session");
                TurnState::new(session_id, limits)
            }
        };
        Ok(state)
    }

    /// What the classifier is told about the session.
    async fn classification_context(&self, state: &TurnState) -> Result<ClassificationContext, GateError> {
        let available_flows = self.flows.available_flows().await?;

        let active_flow = state.active_instance().map(|i| i.definition_name.clone());
        let slot_history = state.active_slots();

        let expected_slots = match &active_flow {
            Some(name) => match self.flows.get_definition(name).await? {
                Some(definition) => definition
                    .collected_slots()
                    .into_iter()
                    .filter(|slot| !slot_history.contains_key(*slot))
                    .cloned()
                    .collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        Ok(ClassificationContext {
            active_flow,
            expected_slots,
            currently_prompted_slot: state.waiting_for_slot.clone(),
            available_flows,
            slot_history,
            conversation_state: state.conversation_state,
        })
    }

    /// Snapshot of every definition this turn may touch: the flows on the
    /// stack plus an interruption target.
    async fn catalog_for(
        &self,
        state: &TurnState,
        message: &ClassifiedMessage,
    ) -> Result<FlowCatalog, GateError> {
        let mut names = state.flow_stack.flow_names();
        if let ClassifiedMessage::Interruption { target_flow } = message {
            if !names.contains(target_flow) {
                names.push(target_flow.clone());
            }
        }

        let mut catalog = FlowCatalog::new();
        for name in names {
            if let Some(definition) = self.fetch_valid(&name).await? {
                catalog.insert(definition);
            }
        }
        Ok(catalog)
    }

    async fn fetch_valid(
        &self,
        name: &FlowName,
    ) -> Result<Option<FlowDefinition>, GateError> {
        let Some(definition) = self.flows.get_definition(name).await? else {
            return Ok(None);
        };

        if let Err(err) = definition.validate() {
            error!(
                target: "dialogue_engine::config",
                flow = %name,
                error = %err,
                "Provider served an invalid flow definition"
            );
            return Ok(None);
        }
        Ok(Some(definition))
    }

    fn timeout_emission(&self, state: &TurnState) -> Emission {
        let responses = self.orchestrator.responses();
        let prompt = state
            .active_prompt
            .as_deref()
            .unwrap_or(&responses.idle_prompt);
        Emission::Prompt(join_text([
            responses.apology(ErrorCategory::ClassificationTimeout),
            prompt,
        ]))
    }
}
