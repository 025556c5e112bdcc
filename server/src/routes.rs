//! HTTP surface: the ask, clue, and health endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use gumshoe_engine::Interrogator;
use gumshoe_types::SuspectKey;

/// Shared state behind every handler.
pub struct AppState {
    interrogator: Interrogator,
}

impl AppState {
    #[must_use]
    pub fn new(interrogator: Interrogator) -> Self {
        Self { interrogator }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/ask", post(ask))
        .route("/api/clue", get(clue))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

// ============================================================================
// POST /api/ask
// ============================================================================

/// Fields are optional so an incomplete body gets our 400 message instead of
/// a generic deserialization rejection.
#[derive(Debug, Deserialize)]
struct AskRequest {
    suspect: Option<String>,
    question: Option<String>,
}

async fn ask(State(state): State<Arc<AppState>>, Json(request): Json<AskRequest>) -> Response {
    let (Some(suspect), Some(question)) = (request.suspect, request.question) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing suspect or question");
    };

    match state.interrogator.ask(&suspect, &question).await {
        Ok(answer) => (
            StatusCode::OK,
            Json(serde_json::json!({ "response": answer })),
        )
            .into_response(),
        Err(e) if e.is_caller_error() => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            match std::error::Error::source(&e) {
                Some(cause) => tracing::error!(error = %e, %cause, "Interrogation failed"),
                None => tracing::error!(error = %e, "Interrogation failed"),
            }
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

// ============================================================================
// GET /api/clue
// ============================================================================

async fn clue(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (Some(day), Some(suspect)) = (params.get("day"), params.get("suspect")) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing day or suspect");
    };
    let Ok(day) = day.parse::<u8>() else {
        return error_response(StatusCode::BAD_REQUEST, "day must be an integer");
    };
    let Ok(key) = SuspectKey::new(suspect) else {
        return error_response(StatusCode::BAD_REQUEST, "suspect must not be empty");
    };

    let text = state.interrogator.store().clue(day, &key);
    (StatusCode::OK, Json(serde_json::json!({ "clue": text }))).into_response()
}

// ============================================================================
// GET /health
// ============================================================================

#[derive(Debug, Serialize)]
struct RetryConfigReport {
    max_attempts: u32,
    initial_backoff_ms: u128,
    max_backoff_ms: u128,
    request_timeout_ms: u128,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    timestamp: String,
    configured: bool,
    server_version: &'static str,
    retry_config: RetryConfigReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    openai_test: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    openai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    openai_error: Option<String>,
}

/// Always 200. `?test_openai=true` additionally runs one zero-temperature
/// diagnostic completion and reports the outcome.
async fn health(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<HealthReport> {
    let retry = state.interrogator.retry_config();
    let mut report = HealthReport {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        configured: true,
        server_version: env!("CARGO_PKG_VERSION"),
        retry_config: RetryConfigReport {
            max_attempts: retry.max_attempts,
            initial_backoff_ms: retry.initial_backoff.as_millis(),
            max_backoff_ms: retry.max_backoff.as_millis(),
            request_timeout_ms: gumshoe_providers::REQUEST_TIMEOUT.as_millis(),
        },
        openai_test: None,
        openai_response: None,
        openai_error: None,
    };

    if params.get("test_openai").is_some_and(|v| v == "true") {
        match state.interrogator.ping().await {
            Ok(reply) => {
                report.openai_test = Some("success");
                report.openai_response = Some(reply);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Health-check diagnostic call failed");
                report.openai_test = Some("failed");
                report.openai_error = Some(e.to_string());
            }
        }
    }

    Json(report)
}
