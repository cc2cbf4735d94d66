//! Handler-owned metadata carried between turns.
//!
//! At most one pattern owns the metadata at a time. `PatternMetadata::set`
//! is the only writer, and replacing the record drops whatever another
//! pattern left behind, so a confirmation retry counter can never survive
//! into a correction (or the other way round).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::SlotName;

/// Confirmation bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationMeta {
    /// Consecutive unclear answers.
    pub retries: u8,
    /// The user said "no"; a modification is expected next.
    pub declined: bool,
}

/// Slots a correction just rewrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionMeta {
    pub slots: Vec<SlotName>,
}

/// Slots a modification just rewrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationMeta {
    pub slots: Vec<SlotName>,
}

/// The record owned by exactly one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "owner", rename_all = "snake_case")]
pub enum PatternMeta {
    Confirmation(ConfirmationMeta),
    Correction(CorrectionMeta),
    Modification(ModificationMeta),
}

/// Pattern metadata slot of a `TurnState`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternMetadata(Option<PatternMeta>);

impl PatternMetadata {
    /// Replaces the current record. Any record owned by another pattern is
    /// discarded.
    pub fn set(&mut self, meta: PatternMeta) {
        self.0 = Some(meta);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self) -> Option<&PatternMeta> {
        self.0.as_ref()
    }

    pub fn confirmation(&self) -> Option<&ConfirmationMeta> {
        match &self.0 {
            Some(PatternMeta::Confirmation(meta)) => Some(meta),
            _ => None,
        }
    }

    pub fn correction(&self) -> Option<&CorrectionMeta> {
        match &self.0 {
            Some(PatternMeta::Correction(meta)) => Some(meta),
            _ => None,
        }
    }

    pub fn modification(&self) -> Option<&ModificationMeta> {
        match &self.0 {
            Some(PatternMeta::Modification(meta)) => Some(meta),
            _ => None,
        }
    }

    /// Unclear confirmation answers so far; zero if another pattern owns
    /// the metadata.
    pub fn confirmation_retries(&self) -> u8 {
        self.confirmation().map(|m| m.retries).unwrap_or(0)
    }
}
