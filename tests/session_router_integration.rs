//! Integration tests for the session router.
//!
//! Verifies that:
//! 1. Messages for one session run strictly one turn at a time, in order
//! 2. Different sessions run concurrently
//! 3. Shutdown drains queued turns before returning

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dialogue_engine::adapters::{
    InMemoryCheckpointStore, InMemoryFlowProvider, MockActionExecutor, MockClassifier,
};
use dialogue_engine::application::{HumanInputGate, SessionRouter, SessionRouterError, TurnOrchestrator};
use dialogue_engine::config::RuntimeConfig;
use dialogue_engine::domain::dialogue::{ClassifiedMessage, Emission, EngineLimits, ResponseTemplates};
use dialogue_engine::domain::flow::{FlowDefinition, StepSpec};
use dialogue_engine::domain::foundation::{SessionId, SlotName};
use dialogue_engine::ports::CheckpointStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn signup() -> FlowDefinition {
    FlowDefinition::new(
        "signup",
        vec![
            StepSpec::collect("name"),
            StepSpec::collect("email"),
            StepSpec::action("create_account"),
        ],
    )
    .with_completion_message("Welcome aboard, {name}.")
}

fn classifier(delay: Duration) -> MockClassifier {
    MockClassifier::new()
        .on("sign me up", ClassifiedMessage::interrupt("signup"))
        .on("ana", ClassifiedMessage::slot_value([("name", json!("Ana"))]))
        .on("ana@example.com", ClassifiedMessage::slot_value([("email", json!("ana@example.com"))]))
        .with_delay(delay)
}

fn router(
    store: Arc<InMemoryCheckpointStore>,
    executor: Arc<MockActionExecutor>,
    delay: Duration,
    config: &RuntimeConfig,
) -> Arc<SessionRouter> {
    let orchestrator = TurnOrchestrator::new(EngineLimits::default(), ResponseTemplates::default(), executor);
    let gate = HumanInputGate::new(
        Arc::new(classifier(delay)),
        Arc::new(InMemoryFlowProvider::with_flows([signup()]).unwrap()),
        store,
        orchestrator,
    );
    Arc::new(SessionRouter::from_config(Arc::new(gate), config))
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn queued_messages_run_in_order() {
    let store = Arc::new(InMemoryCheckpointStore::new());
    let executor = Arc::new(MockActionExecutor::new());
    let router = router(
        store.clone(),
        executor.clone(),
        Duration::from_millis(10),
        &RuntimeConfig::default(),
    );
    let session_id = SessionId::new();

    // Submitted back to back without awaiting; each waits for the previous turn.
    let first = tokio::spawn({
        let router = router.clone();
        async move { router.submit(session_id, "sign me up").await }
    });
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = tokio::spawn({
        let router = router.clone();
        async move { router.submit(session_id, "Ana").await }
    });
    tokio::time::sleep(Duration::from_millis(2)).await;
    let third = tokio::spawn({
        let router = router.clone();
        async move { router.submit(session_id, "ana@example.com").await }
    });

    assert_eq!(first.await.unwrap().unwrap(), Emission::Prompt("What is the name?".into()));
    assert_eq!(second.await.unwrap().unwrap(), Emission::Prompt("What is the email?".into()));
    assert_eq!(
        third.await.unwrap().unwrap(),
        Emission::Terminal("Welcome aboard, Ana.".into())
    );

    let calls = executor.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].inputs["email"], json!("ana@example.com"));

    let state = store.load(session_id).await.unwrap().unwrap();
    assert_eq!(state.turn_count, 3);
    assert!(state.flow_stack.is_empty());
}

#[tokio::test]
async fn sessions_run_side_by_side() {
    let store = Arc::new(InMemoryCheckpointStore::new());
    let delay = Duration::from_millis(100);
    let router = router(
        store.clone(),
        Arc::new(MockActionExecutor::new()),
        delay,
        &RuntimeConfig::default(),
    );
    let sessions: Vec<SessionId> = (0..4).map(|_| SessionId::new()).collect();

    let started = Instant::now();
    let submits = sessions.iter().map(|session_id| {
        let router = router.clone();
        let session_id = *session_id;
        async move { router.submit(session_id, "sign me up").await }
    });
    for result in futures::future::join_all(submits).await {
        result.unwrap();
    }

    // Serialised, four turns would take at least 400ms.
    assert!(started.elapsed() < delay * 3);
    assert_eq!(router.active_sessions().await, 4);
    for session_id in &sessions {
        let state = store.load(*session_id).await.unwrap().unwrap();
        assert_eq!(state.waiting_for_slot, Some(SlotName::from("name")));
    }
}

#[tokio::test]
async fn worker_pool_bounds_concurrent_turns() {
    let store = Arc::new(InMemoryCheckpointStore::new());
    let delay = Duration::from_millis(50);
    let config = RuntimeConfig {
        worker_pool_size: 1,
        ..RuntimeConfig::default()
    };
    let router = router(store, Arc::new(MockActionExecutor::new()), delay, &config);

    let started = Instant::now();
    let submits = (0..3).map(|_| {
        let router = router.clone();
        async move { router.submit(SessionId::new(), "sign me up").await }
    });
    for result in futures::future::join_all(submits).await {
        result.unwrap();
    }

    assert!(started.elapsed() >= delay * 3);
}

#[tokio::test]
async fn shutdown_finishes_queued_turns() {
    let store = Arc::new(InMemoryCheckpointStore::new());
    let router = router(
        store.clone(),
        Arc::new(MockActionExecutor::new()),
        Duration::from_millis(30),
        &RuntimeConfig::default(),
    );
    let session_id = SessionId::new();

    let pending = tokio::spawn({
        let router = router.clone();
        async move { router.submit(session_id, "sign me up").await }
    });
    tokio::time::sleep(Duration::from_millis(5)).await;

    router.shutdown().await;

    assert!(pending.await.unwrap().is_ok());
    assert_eq!(store.load(session_id).await.unwrap().unwrap().turn_count, 1);
    assert!(matches!(
        router.submit(session_id, "Ana").await,
        Err(SessionRouterError::ShuttingDown)
    ));
}
