//! Core domain types for Gumshoe.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the application.

mod budget;
mod case;

pub use budget::QuestionBudget;
pub use case::{
    CaseError, CasePhase, CaseRun, Clue, DaySession, InterrogationTurn, TOP_SUSPECT_COUNT,
    TOTAL_DAYS,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Suspect identity
// ============================================================================

/// A suspect's unique key, case-insensitive by construction.
///
/// Stored lowercase so that lookups and comparisons never depend on how the
/// caller spelled the name. Guaranteed non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SuspectKey(String);

#[derive(Debug, Error)]
#[error("suspect name must not be empty")]
pub struct InvalidSuspectKey;

impl SuspectKey {
    pub fn new(value: impl AsRef<str>) -> Result<Self, InvalidSuspectKey> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            Err(InvalidSuspectKey)
        } else {
            Ok(Self(trimmed.to_ascii_lowercase()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key with its first letter capitalized, for player-facing text.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl TryFrom<String> for SuspectKey {
    type Error = InvalidSuspectKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SuspectKey {
    type Error = InvalidSuspectKey;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SuspectKey> for String {
    fn from(value: SuspectKey) -> Self {
        value.0
    }
}

impl std::fmt::Display for SuspectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Question text
// ============================================================================

/// A player question, guaranteed non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Question(String);

#[derive(Debug, Error)]
#[error("question must not be empty")]
pub struct EmptyQuestionError;

impl Question {
    pub fn new(value: impl AsRef<str>) -> Result<Self, EmptyQuestionError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            Err(EmptyQuestionError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Question {
    type Error = EmptyQuestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Question> for String {
    fn from(value: Question) -> Self {
        value.0
    }
}

// ============================================================================
// Provider credential
// ============================================================================

/// A provider API key that never leaks through `Debug` or logs.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw secret. Call sites should be limited to request signing.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
