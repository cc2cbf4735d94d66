//! Mock Classifier for testing.
//!
//! Returns pre-configured classifications instead of calling a real
//! classifier, so conversations can be scripted end to end.
//!
//! # Features
//!
//! - Scripted classifications consumed in order
//! - Exact-utterance rules for order-independent scripts
//! - Simulated delays for timeout testing
//! - Error injection
//! - Call tracking, including the context each call received
//!
//! # Example
//!
//! ```ignore
//! let classifier = MockClassifier::new()
//!     .on("book a flight", ClassifiedMessage::interrupt("book_flight"))
//!     .with_delay(Duration::from_millis(50));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::dialogue::ClassifiedMessage;
use crate::ports::{ClassificationContext, Classifier, ClassifierError};

/// A scripted classifier answer.
#[derive(Debug, Clone)]
pub enum MockClassification {
    Message(ClassifiedMessage),
    Error(ClassifierError),
}

/// One recorded call.
#[derive(Debug, Clone)]
pub struct ClassifierCall {
    pub utterance: String,
    pub context: ClassificationContext,
}

/// Mock classifier for testing.
#[derive(Debug, Clone, Default)]
pub struct MockClassifier {
    script: Arc<Mutex<VecDeque<MockClassification>>>,
    rules: Arc<Mutex<HashMap<String, ClassifiedMessage>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<ClassifierCall>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a classification to the script.
    pub fn with_message(self, message: ClassifiedMessage) -> Self {
        self.push(MockClassification::Message(message));
        self
    }

    /// Adds an error to the script.
    pub fn with_error(self, error: ClassifierError) -> Self {
        self.push(MockClassification::Error(error));
        self
    }

    /// Always classifies `utterance` (trimmed, case-insensitive) as `message`
    /// once the script is exhausted.
    pub fn on(self, utterance: &str, message: ClassifiedMessage) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize(utterance), message);
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

    pub fn get_calls(&self) -> Vec<ClassifierCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(&self, entry: MockClassification) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entry);
    }

    /// Next scripted answer, then a matching rule, then `Continuation`.
    fn next_classification(&self, utterance: &str) -> MockClassification {
        if let Some(entry) = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            return entry;
        }

        let rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        MockClassification::Message(
            rules
                .get(&normalize(utterance))
                .cloned()
                .unwrap_or(ClassifiedMessage::Continuation),
        )
    }
}

fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        utterance: &str,
        context: &ClassificationContext,
    ) -> Result<ClassifiedMessage, ClassifierError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ClassifierCall {
                utterance: utterance.to_string(),
                context: context.clone(),
            });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_classification(utterance) {
            MockClassification::Message(message) => Ok(message),
            MockClassification::Error(error) => Err(error),
        }
    }
}
