//! What a turn (or a single handler) hands back.

use serde::{Deserialize, Serialize};

/// Output of the gate: the text shown to the user and whether the
/// conversation is waiting for more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Emission {
    /// Suspended; the next utterance resumes the conversation.
    Prompt(String),
    /// All tasks finished.
    Terminal(String),
}

impl Emission {
    pub fn text(&self) -> &str {
        match self {
            Emission::Prompt(text) | Emission::Terminal(text) => text,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Emission::Terminal(_))
    }
}

/// Output of a pattern handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerEmission {
    /// Suspend with this text.
    Prompt(String),
    /// Keep processing internally; `preface` is said before whatever comes
    /// next.
    Continue { preface: Option<String> },
}

impl HandlerEmission {
    pub fn continue_with(preface: Option<String>) -> Self {
        HandlerEmission::Continue { preface }
    }

    pub fn is_prompt(&self) -> bool {
        matches!(self, HandlerEmission::Prompt(_))
    }
}

/// Joins the non-empty parts with single spaces.
pub fn join_text<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .map(|p| p.as_ref().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
