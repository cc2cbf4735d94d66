//! Classifier Adapters - Implementations of the Classifier port.
//!
//! Only a scripted mock ships with the engine; production classifiers live
//! with the bot that embeds it.

mod mock_classifier;

pub use mock_classifier::{ClassifierCall, MockClassification, MockClassifier};
