//! Mock Action Executor for testing.
//!
//! Answers action calls from per-call scripts so flows with `Action` steps
//! can run without any business logic behind them.
//!
//! # Example
//!
//! ```ignore
//! let executor = MockActionExecutor::new()
//!     .with_output("search", [("fare", json!(120))])
//!     .with_error("book", ActionError::Failed { reason: "sold out".into(), retryable: false });
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::flow::SlotValue;
use crate::ports::{ActionError, ActionExecutor, ActionPayload};

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCallRecord {
    pub call: String,
    pub inputs: ActionPayload,
}

/// Mock action executor for testing.
///
/// Each call name has its own queue of results. Once a queue is empty the
/// call succeeds with no outputs.
#[derive(Debug, Clone, Default)]
pub struct MockActionExecutor {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<ActionPayload, ActionError>>>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<ActionCallRecord>>>,
}

impl MockActionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful result for `call`.
    pub fn with_output<I, K>(self, call: &str, outputs: I) -> Self
    where
        I: IntoIterator<Item = (K, SlotValue)>,
        K: Into<String>,
    {
        let payload = outputs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.push(call, Ok(payload));
        self
    }

    /// Queues a failure for `call`.
    pub fn with_error(self, call: &str, error: ActionError) -> Self {
        self.push(call, Err(error));
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn get_calls(&self) -> Vec<ActionCallRecord> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Names of the calls made, in order.
    pub fn call_names(&self) -> Vec<String> {
        self.get_calls().into_iter().map(|c| c.call).collect()
    }

    fn push(&self, call: &str, result: Result<ActionPayload, ActionError>) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(call.to_string())
            .or_default()
            .push_back(result);
    }
}

#[async_trait]
impl ActionExecutor for MockActionExecutor {
    async fn execute(&self, call: &str, inputs: &ActionPayload) -> Result<ActionPayload, ActionError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ActionCallRecord {
                call: call.to_string(),
                inputs: inputs.clone(),
            });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(call)
            .and_then(VecDeque::pop_front);

        next.unwrap_or_else(|| Ok(ActionPayload::new()))
    }
}
