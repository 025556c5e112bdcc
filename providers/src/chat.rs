//! OpenAI Chat Completions client.

use serde::{Deserialize, Serialize};

use gumshoe_types::ApiKey;

use crate::retry::{RetryConfig, send_with_retry};
use crate::{CONNECT_TIMEOUT_SECS, DEFAULT_MODEL, OPENAI_API_BASE_URL, ProviderError, REQUEST_TIMEOUT};

/// Sampling temperature for gameplay calls.
pub const GAMEPLAY_TEMPERATURE: f32 = 0.7;

/// Sampling temperature for the diagnostic liveness call.
pub const DIAGNOSTIC_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message in the two-message exchange sent per interrogation turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Chat Completions client with the retry policy baked in.
///
/// Holds no mutable state; a single instance serves the whole process.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    model: String,
    retry: RetryConfig,
}

impl ChatClient {
    pub fn new(api_key: ApiKey) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: OPENAI_API_BASE_URL.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            retry: RetryConfig::default(),
        })
    }

    /// Point the client at a different base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run one completion and return the trimmed text of the first choice.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| ProviderError::Upstream(format!("failed to encode request: {e}")))?;

        tracing::debug!(model = %self.model, temperature, "Sending completion request");
        let response = send_with_retry(
            || {
                self.http
                    .post(&url)
                    .bearer_auth(self.api_key.expose_secret())
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body.clone())
            },
            &self.retry,
        )
        .await?;

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(format!("malformed completion response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                ProviderError::Upstream("completion contained no choices".to_string())
            })
    }
}
