// =============================================================================
// FX Signal Desk — Main Entry Point
// =============================================================================
//
// Serves BUY / SELL / NONE signals for a handful of FX pairs computed from
// 1-minute bars. A new signal stays pending for a fixed window before it is
// reported as executed; only one signal may be pending at a time.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod indicators;
mod market_data;
mod runtime_config;
mod signal_book;
mod signals;
mod types;

#[cfg(test)]
mod test_fixtures;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::YahooClient;
use crate::runtime_config::RuntimeConfig;

const DEFAULT_CONFIG_PATH: &str = "signal_desk.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("FX Signal Desk starting up");

    let config_path =
        std::env::var("SIGNAL_DESK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = match RuntimeConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            let config = RuntimeConfig::default();
            if !std::path::Path::new(&config_path).exists() {
                if let Err(e) = config.save(&config_path) {
                    warn!(error = %e, "Failed to write default config");
                }
            }
            config
        }
    };

    if let Ok(addr) = std::env::var("SIGNAL_DESK_BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Ok(url) = std::env::var("SIGNAL_DESK_PRICE_URL") {
        config.price_base_url = url;
    }
    config.normalise();

    // ── 2. Price source ──────────────────────────────────────────────────
    let prices = YahooClient::new(
        config.price_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    // ── 3. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(prices)));
    state.log_startup();

    // ── 4. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 5. Serve until Ctrl+C ────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            warn!("Shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    if let Some(pending) = state.pending() {
        info!(
            asset = %pending.asset,
            signal = %pending.signal,
            "pending signal discarded on shutdown"
        );
    }

    info!("FX Signal Desk shut down complete.");
    Ok(())
}
