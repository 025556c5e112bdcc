//! The request orchestrator.

use thiserror::Error;

use gumshoe_content::{ContentError, ContentStore};
use gumshoe_providers::{ChatClient, ChatMessage, GAMEPLAY_TEMPERATURE, DIAGNOSTIC_TEMPERATURE, ProviderError, RetryConfig};
use gumshoe_types::{CaseError, Question, SuspectKey};

/// Fixed system instruction establishing the assistant's role.
const SYSTEM_INSTRUCTION: &str = "You are a detective AI assistant. Your task is to help generate \
     responses for a character in a murder mystery interrogation.";

/// Prompt sent by the diagnostic liveness check.
const LIVENESS_PROMPT: &str = "Say 'OK' if you can hear me.";

#[derive(Debug, Error)]
pub enum InterrogationError {
    /// Bad caller input. Rejected before any network activity; maps to 400.
    #[error("{0}")]
    Validation(String),
    /// A state-machine guard rejected the operation (caller error).
    #[error(transparent)]
    Case(#[from] CaseError),
    /// Content that must exist is missing or unreadable.
    #[error(transparent)]
    Content(#[from] ContentError),
    /// The provider call failed; classification preserved.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl InterrogationError {
    /// True for errors the caller caused (bad input, guard violations),
    /// which the HTTP layer surfaces as 400 rather than 500.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Case(_))
    }
}

/// Turns a player's free-text question into a validated, retried, timed
/// provider call. Holds no per-run state; every failure reaches the caller
/// as a typed error.
#[derive(Debug, Clone)]
pub struct Interrogator {
    store: ContentStore,
    client: ChatClient,
}

impl Interrogator {
    #[must_use]
    pub fn new(store: ContentStore, client: ChatClient) -> Self {
        Self { store, client }
    }

    #[must_use]
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        self.client.retry_config()
    }

    /// Ask `suspect` one question and return the character's answer.
    ///
    /// Validation failures (blank question, unknown suspect) are rejected
    /// before any network activity.
    pub async fn ask(&self, suspect: &str, question: &str) -> Result<String, InterrogationError> {
        let suspect = SuspectKey::new(suspect)
            .map_err(|e| InterrogationError::Validation(e.to_string()))?;
        let question = Question::new(question)
            .map_err(|e| InterrogationError::Validation(e.to_string()))?;

        let profile = match self.store.profile(&suspect) {
            Ok(profile) => profile,
            Err(ContentError::ProfileNotFound(key)) => {
                return Err(InterrogationError::Validation(format!(
                    "unknown suspect: {key}"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let template = self.store.prompt_template()?;
        let filled = template.fill(&suspect, &profile, question.as_str());
        let messages = [
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(filled),
        ];

        let answer = self.client.complete(&messages, GAMEPLAY_TEMPERATURE).await?;
        tracing::info!(suspect = %suspect, "Generated interrogation answer");
        Ok(answer)
    }

    /// Zero-temperature liveness call for the health check.
    pub async fn ping(&self) -> Result<String, ProviderError> {
        self.client
            .complete(&[ChatMessage::user(LIVENESS_PROMPT)], DIAGNOSTIC_TEMPERATURE)
            .await
    }
}
