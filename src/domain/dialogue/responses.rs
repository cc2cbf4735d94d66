//! User-facing text.
//!
//! Every string can be overridden from configuration. Templates use
//! `{placeholder}` syntax; the placeholders each template understands are
//! listed on its field.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::ErrorCategory;
use crate::domain::flow::render_template;

/// Apology per error category. Each category has its own wording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApologyTemplates {
    pub stack_depth: String,
    pub confirmation_exhausted: String,
    pub action_failure: String,
    pub misconfigured_flow: String,
    pub classification_timeout: String,
    pub nothing_to_cancel: String,
    /// `{flow}`
    pub unknown_flow: String,
}

impl Default for ApologyTemplates {
    fn default() -> Self {
        Self {
            stack_depth: "I can't take on another task until we finish one of these.".to_string(),
            confirmation_exhausted: "I'm having trouble understanding, let's start over.".to_string(),
            action_failure: "Sorry, something went wrong running that.".to_string(),
            misconfigured_flow: "Sorry, that task isn't set up correctly. I've let the team know."
                .to_string(),
            classification_timeout: "Sorry, I didn't quite get that in time. Could you say it again?"
                .to_string(),
            nothing_to_cancel: "There's nothing to cancel right now.".to_string(),
            unknown_flow: "Sorry, I can't help with {flow} yet.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTemplates {
    pub idle_prompt: String,
    /// `{slot}` (humanized), `{flow}`
    pub slot_prompt: String,
    /// `{flow}`
    pub completion: String,
    /// `{slot}`, `{flow}`
    pub clarification: String,
    /// `{flow}`
    pub clarification_general: String,
    pub no_active_task: String,
    /// Canned answers keyed by lowercase topic.
    pub digression_answers: HashMap<String, String>,
    /// `{topic}`
    pub digression_fallback: String,
    /// `{flow}`
    pub digression_limit: String,
    /// `{slots}`
    pub corrected: String,
    pub confirmation_retry: String,
    pub confirmation_declined: String,
    /// `{flow}`
    pub cancelled: String,
    /// `{flow}`
    pub resuming: String,
    /// `{flow}`
    pub still_working: String,
    /// `{slot}`, `{reason}`
    pub invalid_slot: String,
    pub apologies: ApologyTemplates,
}

impl Default for ResponseTemplates {
    fn default() -> Self {
        Self {
            idle_prompt: "What can I help you with?".to_string(),
            slot_prompt: "What is the {slot}?".to_string(),
            completion: "All done with {flow}.".to_string(),
            clarification: "I need the {slot} to continue with {flow}.".to_string(),
            clarification_general: "I'm working on {flow} and need a bit more from you.".to_string(),
            no_active_task: "We're not in the middle of anything.".to_string(),
            digression_answers: HashMap::new(),
            digression_fallback: "I don't have an answer about {topic} right now.".to_string(),
            digression_limit: "Let's get back to {flow}.".to_string(),
            corrected: "Got it, I've updated {slots}.".to_string(),
            confirmation_retry: "Sorry, I didn't catch that. Please answer yes or no.".to_string(),
            confirmation_declined: "No problem. What would you like to change?".to_string(),
            cancelled: "Okay, I've cancelled {flow}.".to_string(),
            resuming: "Back to {flow}.".to_string(),
            still_working: "Still working on {flow}. Let me know when to carry on.".to_string(),
            invalid_slot: "That {slot} won't work: {reason}.".to_string(),
            apologies: ApologyTemplates::default(),
        }
    }
}

impl ResponseTemplates {
    /// Fills `{key}` placeholders from `vars`.
    pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
        render_template(template, |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        })
    }

    /// Apology text for an error category.
    pub fn apology(&self, category: ErrorCategory) -> &str {
        let a = &self.apologies;
        match category {
            ErrorCategory::StackDepth => &a.stack_depth,
            ErrorCategory::ConfirmationExhausted => &a.confirmation_exhausted,
            ErrorCategory::ActionFailure => &a.action_failure,
            ErrorCategory::MisconfiguredFlow => &a.misconfigured_flow,
            ErrorCategory::ClassificationTimeout => &a.classification_timeout,
            ErrorCategory::NothingToCancel => &a.nothing_to_cancel,
            ErrorCategory::UnknownFlow => &a.unknown_flow,
        }
    }

    /// Answer for a digression topic, falling back to a generic reply.
    pub fn digression_answer(&self, topic: &str) -> String {
        let key = topic.trim().to_lowercase();
        match self.digression_answers.get(&key) {
            Some(answer) => answer.clone(),
            None => Self::render(&self.digression_fallback, &[("topic", topic.trim())]),
        }
    }
}
