//! Generative-text provider client.
//!
//! # Architecture
//!
//! - [`ChatClient`] - OpenAI Chat Completions client; one call per
//!   interrogation turn, no streaming.
//! - [`retry`] - bounded-retry, bounded-backoff send loop.
//! - [`classify`] - the failure taxonomy: which provider rejections are
//!   terminal and which transport failures earn another attempt.
//!
//! # Error Handling
//!
//! Every failure reaches the caller as a typed [`ProviderError`]; nothing is
//! logged-and-swallowed. Terminal rejections (auth, quota, rate limit) carry
//! the provider's own message. [`ProviderError::RetriesExhausted`] hides its
//! immediate cause from the user-facing message but keeps it as `source()`
//! so callers can log it.

pub mod chat;
pub mod classify;
pub mod retry;

pub use chat::{ChatClient, ChatMessage, DIAGNOSTIC_TEMPERATURE, GAMEPLAY_TEMPERATURE};
pub use retry::RetryConfig;

use reqwest::StatusCode;
use thiserror::Error;

/// Canonical OpenAI API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com";

/// Model used for all gameplay and diagnostic calls.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Per-call wall-clock timeout. A call that outlives this is treated as a
/// retryable transport failure.
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// The immediate cause of a retryable failure, preserved for logging.
#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error(transparent)]
    Connection(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Invalid or missing credential. Never retried.
    #[error("invalid OpenAI API key: {0}")]
    Auth(String),
    /// Quota or billing exhaustion. Never retried.
    #[error("OpenAI API quota exceeded: {0}")]
    Quota(String),
    /// Rate-limit rejection. Deliberately never retried.
    #[error("OpenAI API rate limit exceeded: {0}")]
    RateLimit(String),
    /// Unclassified provider failure, original message preserved. Not retried.
    #[error("OpenAI request failed: {0}")]
    Upstream(String),
    /// Retryable failures on every attempt. The user-facing message names
    /// only the attempt count; the cause stays available via `source()`.
    #[error("OpenAI request failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        cause: TransportFailure,
    },
}

/// Read an error response body, capped so a misbehaving upstream cannot
/// balloon logs or error messages.
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(mut body) => {
            if body.len() > MAX_ERROR_BODY_BYTES {
                let mut end = MAX_ERROR_BODY_BYTES;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
                body.push_str("...(truncated)");
            }
            body
        }
        Err(e) => format!("<unreadable error body: {e}>"),
    }
}
