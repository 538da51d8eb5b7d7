use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dotenv::dotenv;
use lumen_net::{ApiError, ClientConfig, TokenIssuer};
use lumen_session::{MemoryLocation, SessionRuntime};
use tracing_subscriber::EnvFilter;

/// Reads the bearer token from LUMEN_TOKEN on every refresh.
struct EnvTokenIssuer;

#[async_trait]
impl TokenIssuer for EnvTokenIssuer {
    async fn issue(&self) -> Result<Option<String>, ApiError> {
        Ok(std::env::var("LUMEN_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // lumen [query-string], e.g. lumen 'q=forest&type=audio&page=2'
    let query = std::env::args().nth(1).unwrap_or_default();
    let config = ClientConfig::from_env();
    let location = Arc::new(MemoryLocation::new());

    let runtime = SessionRuntime::start(config, Arc::new(EnvTokenIssuer), location.clone())
        .await
        .context("session start failed")?;
    if let Err(e) = runtime.session.restore_from_location(&query).await {
        tracing::warn!(target: "lumen_session", "restore failed: {e}");
    }

    let view = runtime.session.view();
    println!(
        "{}",
        serde_json::to_string_pretty(&view).context("encoding view state")?
    );
    runtime.shutdown().await;
    Ok(())
}
