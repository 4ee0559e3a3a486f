// =============================================================================
// EMA Crossover Chart — Main Entry Point
// =============================================================================
//
// Serves a single form: submit a ticker, get back its two-year daily close
// with 100/200-day EMAs and crossover buy/sell markers drawn as a PNG chart.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod chart;
mod indicators;
mod market_data;
mod runtime_config;
mod signals;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::YahooClient;
use crate::runtime_config::RuntimeConfig;

const DEFAULT_CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "EMA crossover chart service starting up");

    let config_path =
        std::env::var("CHART_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        bind_addr = %config.bind_addr,
        provider = %config.provider_base_url,
        timeout_secs = config.request_timeout().as_secs(),
        chart = %format!("{}x{}", config.chart_width, config.chart_height),
        "Configuration resolved"
    );

    // ── 2. Market data client & shared state ─────────────────────────────
    let client = YahooClient::new(
        &config.provider_base_url,
        &config.user_agent,
        config.request_timeout(),
    )?;

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(client)));

    // ── 3. HTTP server ───────────────────────────────────────────────────
    let app = api::routes::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP server to {bind_addr}"))?;
    info!(addr = %bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("EMA crossover chart service shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received — stopping gracefully");
}
