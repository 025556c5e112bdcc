//! Bounded-retry send loop with exponential backoff.
//!
//! # Retry Policy
//!
//! - Up to 3 total attempts.
//! - Backoff before retry: `min(initial * 2^attempt, max)` with an initial
//!   delay of 1 s and a 10 s cap - so 1 s, then 2 s, capped thereafter.
//!   No jitter: the schedule is part of the observable contract.
//! - Retryable: transport failures (reset, DNS, refused, timeout,
//!   unreachable) and any server-side 5xx.
//! - Terminal without retry: auth (401), quota (402 or quota-coded 429),
//!   rate limit (429), and anything unclassified.

use std::time::Duration;

use reqwest::RequestBuilder;

use crate::classify::{FailureClass, classify_status, error_message_from_body, is_retryable_transport};
use crate::{ProviderError, TransportFailure, read_error_body};

/// Retry knobs. The defaults are the production policy; tests swap in
/// millisecond delays.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Backoff cap.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(10_000),
        }
    }
}

/// Backoff before the retry following `attempt` (0-based failed attempt).
#[must_use]
pub fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base = config.initial_backoff.as_secs_f64() * 2.0_f64.powi(attempt.min(31) as i32);
    Duration::from_secs_f64(base.min(config.max_backoff.as_secs_f64()))
}

/// Send a request, retrying per the policy above.
///
/// `build_request` is called once per attempt. Returns the successful
/// response, or the typed error that ended the attempt sequence.
pub async fn send_with_retry<F>(
    build_request: F,
    config: &RetryConfig,
) -> Result<reqwest::Response, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt: u32 = 0;
    loop {
        let failure = match build_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                let body = read_error_body(response).await;
                match classify_status(status, &body) {
                    FailureClass::Auth => {
                        return Err(ProviderError::Auth(error_message_from_body(&body)));
                    }
                    FailureClass::Quota => {
                        return Err(ProviderError::Quota(error_message_from_body(&body)));
                    }
                    FailureClass::RateLimit => {
                        return Err(ProviderError::RateLimit(error_message_from_body(&body)));
                    }
                    FailureClass::Upstream => {
                        return Err(ProviderError::Upstream(format!(
                            "API error {status}: {}",
                            error_message_from_body(&body)
                        )));
                    }
                    FailureClass::Retryable => TransportFailure::Status { status, body },
                }
            }
            Err(e) => {
                if is_retryable_transport(&e) {
                    TransportFailure::Connection(e)
                } else {
                    return Err(ProviderError::Upstream(format!("request failed: {e}")));
                }
            }
        };

        attempt += 1;
        if attempt >= config.max_attempts {
            return Err(ProviderError::RetriesExhausted {
                attempts: attempt,
                cause: failure,
            });
        }

        let delay = backoff_delay(attempt - 1, config);
        tracing::debug!(
            cause = %failure,
            attempt,
            delay_ms = delay.as_millis(),
            "Retrying provider request"
        );
        tokio::time::sleep(delay).await;
    }
}


#[cfg(test)]
mod integration_tests {
    use super::{RetryConfig, send_with_retry};
    use crate::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fast retry config so tests never sleep for real.
    fn fast_retry_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());

        let response = send_with_retry(|| client.get(&url), &fast_retry_config())
            .await
            .expect("should succeed");
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn transport_failures_then_success_uses_three_attempts() {
        let server = MockServer::start().await;
        let attempt = AtomicU32::new(0);

        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(move |_: &wiremock::Request| {
                let n = attempt.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    ResponseTemplate::new(503)
                } else {
                    ResponseTemplate::new(200).set_body_string("third time lucky")
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());

        let response = send_with_retry(|| client.get(&url), &fast_retry_config())
            .await
            .expect("third attempt should succeed");
        assert_eq!(response.text().await.unwrap(), "third time lucky");
    }

    #[tokio::test]
    async fn exhausting_attempts_reports_count_and_keeps_cause() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());

        let err = send_with_retry(|| client.get(&url), &fast_retry_config())
            .await
            .expect_err("should exhaust retries");

        match &err {
            ProviderError::RetriesExhausted { attempts, .. } => assert_eq!(*attempts, 3),
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        let source = std::error::Error::source(&err).expect("cause preserved for logging");
        assert!(source.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn auth_failure_is_terminal_on_first_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error": {"message": "Incorrect API key provided"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());

        let err = send_with_retry(|| client.get(&url), &fast_retry_config())
            .await
            .expect_err("401 must not be retried");
        match err {
            ProviderError::Auth(message) => {
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn quota_failure_is_terminal_on_first_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(402).set_body_string("billing hard limit reached"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());

        let err = send_with_retry(|| client.get(&url), &fast_retry_config())
            .await
            .expect_err("402 must not be retried");
        assert!(matches!(err, ProviderError::Quota(_)));
    }

    #[tokio::test]
    async fn rate_limit_is_terminal_on_first_attempt() {
        let server = MockServer::start().await;

        // This policy deliberately does not back off and retry 429s.
        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit reached"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());

        let err = send_with_retry(|| client.get(&url), &fast_retry_config())
            .await
            .expect_err("429 must not be retried");
        match err {
            ProviderError::RateLimit(message) => assert_eq!(message, "Rate limit reached"),
            other => panic!("expected RateLimit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unclassified_failure_preserves_original_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error": {"message": "We could not parse the JSON body of your request"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());

        let err = send_with_retry(|| client.get(&url), &fast_retry_config())
            .await
            .expect_err("400 must not be retried");
        match err {
            ProviderError::Upstream(message) => {
                assert!(message.contains("We could not parse the JSON body"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_retries_until_exhausted() {
        // Nothing is listening on this port; every attempt fails at the
        // transport level.
        let client = reqwest::Client::new();
        let url = "http://127.0.0.1:1/unreachable";

        let err = send_with_retry(|| client.get(url), &fast_retry_config())
            .await
            .expect_err("connection refused should exhaust retries");
        assert!(matches!(
            err,
            ProviderError::RetriesExhausted { attempts: 3, .. }
        ));
    }
}
