//! Gumshoe server binary.
//!
//! Validates configuration (the provider credential above all) before binding
//! the listener, so a misconfigured deployment fails loudly at startup rather
//! than on the first player request.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use gumshoe_content::ContentStore;
use gumshoe_engine::Interrogator;
use gumshoe_providers::{ChatClient, REQUEST_TIMEOUT};
use gumshoe_types::ApiKey;

use crate::routes::AppState;

/// The value shipped in example env files; treated the same as no key at all.
const API_KEY_PLACEHOLDER: &str = "your_openai_api_key_here";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATA_DIR: &str = "data";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_api_key() -> Result<ApiKey> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(value) if value.trim().is_empty() || value == API_KEY_PLACEHOLDER => {
            bail!("OPENAI_API_KEY is set to the placeholder value; supply a real key")
        }
        Ok(value) => Ok(ApiKey::new(value)),
        Err(_) => bail!("OPENAI_API_KEY is not set"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let api_key = load_api_key()?;
    let data_dir =
        std::env::var("GUMSHOE_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    let port = match std::env::var("PORT") {
        Ok(value) => value
            .parse::<u16>()
            .with_context(|| format!("PORT must be a port number, got {value:?}"))?,
        Err(_) => DEFAULT_PORT,
    };

    let client = ChatClient::new(api_key).context("failed to build the provider HTTP client")?;
    let retry = client.retry_config();
    tracing::info!(
        max_attempts = retry.max_attempts,
        initial_backoff_ms = retry.initial_backoff.as_millis(),
        max_backoff_ms = retry.max_backoff.as_millis(),
        request_timeout_ms = REQUEST_TIMEOUT.as_millis(),
        "Provider retry policy"
    );

    let store = ContentStore::new(&data_dir);
    let state = Arc::new(AppState::new(Interrogator::new(store, client)));
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, data_dir, "Gumshoe server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
