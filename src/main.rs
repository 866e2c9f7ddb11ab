// main.rs
// Loads configuration, builds the router and serves it.
//
// Environment (after .env):
// - API_BASE_URL         origin of the accounting API
// - BIND_ADDR            listen address, default 0.0.0.0:8080
// - SESSION_TTL_SECONDS  cookie lifetime
// - LOG_FILTER           tracing filter, e.g. `info,auditdesk=debug`

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auditdesk::{config::AppConfig, routes, state};

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log_filter);

    let addr = config.bind_addr;
    let state = Arc::new(state::init_state(config).context("failed to build API client")?);
    let app = routes::app(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
