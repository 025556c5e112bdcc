//! Failure classification for the retry loop.
//!
//! The taxonomy is an exhaustive tagged classifier with a final catch-all
//! arm. The retryable transport signatures live in one `const` table so the
//! open set of connection-level failures stays test-driven instead of
//! scattered through conditionals.

use reqwest::StatusCode;

/// How a failed provider call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Invalid/missing credential. Terminal.
    Auth,
    /// Quota or billing exhaustion. Terminal.
    Quota,
    /// Rate-limit signal. Terminal: this policy deliberately does not back
    /// off and retry 429s.
    RateLimit,
    /// Transport-level failure or server-side 5xx. Worth another attempt.
    Retryable,
    /// Anything else. Terminal, message preserved.
    Upstream,
}

/// Substrings marking a 429 as quota/billing exhaustion rather than a
/// transient rate limit.
const QUOTA_SIGNATURES: &[&str] = &["insufficient_quota", "quota", "billing"];

/// Substrings identifying retryable connection-level failures in an error
/// chain. Matched case-insensitively against every source in the chain.
const RETRYABLE_TRANSPORT_SIGNATURES: &[&str] = &[
    "connection reset",
    "connection refused",
    "connection closed",
    "dns error",
    "failed to lookup address",
    "timed out",
    "network unreachable",
    "host unreachable",
    "broken pipe",
];

/// Classify a non-success HTTP response.
#[must_use]
pub fn classify_status(status: StatusCode, body: &str) -> FailureClass {
    match status.as_u16() {
        401 => FailureClass::Auth,
        402 => FailureClass::Quota,
        429 => {
            if mentions_quota(body) {
                FailureClass::Quota
            } else {
                FailureClass::RateLimit
            }
        }
        500..=599 => FailureClass::Retryable,
        _ => FailureClass::Upstream,
    }
}

/// Whether a request-level error (no HTTP response) is worth retrying.
#[must_use]
pub fn is_retryable_transport(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }

    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = source {
        let text = err.to_string().to_ascii_lowercase();
        if RETRYABLE_TRANSPORT_SIGNATURES
            .iter()
            .any(|sig| text.contains(sig))
        {
            return true;
        }
        source = err.source();
    }
    false
}

fn mentions_quota(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    QUOTA_SIGNATURES.iter().any(|sig| lower.contains(sig))
}

/// Pull a human-readable message out of a provider error body.
///
/// OpenAI error bodies nest the message under `error.message`; fall back to
/// the raw (already capped) body when the shape is unfamiliar.
#[must_use]
pub fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .pointer("/error/message")
                .or_else(|| payload.pointer("/message"))
                .and_then(|value| value.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
