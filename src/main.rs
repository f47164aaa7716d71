// =============================================================================
// Stayboard — Main Entry Point
// =============================================================================
//
// Backend for the property-management reporting dashboard. Proxies property
// and user administration to the remote reporting API, and computes pricing
// recommendations, commission estimates and CSV exports from the monthly
// metrics it serves.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod commission;
mod export;
mod pricing;
mod report;
mod reporting;
mod settings;
mod store;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::reporting::ReportingClient;
use crate::settings::Settings;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Stayboard starting up");

    // ── 2. Settings store ────────────────────────────────────────────────
    let data_dir = std::env::var("STAYBOARD_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let store: Arc<dyn KeyValueStore> = if data_dir == ":memory:" {
        warn!("STAYBOARD_DATA_DIR is :memory:; settings will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::open(&data_dir)?)
    };

    let settings = Settings::load(store.as_ref()).unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "Failed to load settings, using defaults");
        Settings::default()
    });

    // ── 3. Reporting API client ──────────────────────────────────────────
    let api_url =
        std::env::var("STAYBOARD_API_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let api_token = std::env::var("STAYBOARD_API_TOKEN").ok();
    let reporting = ReportingClient::new(&api_url, api_token)?;
    info!(api_url = %api_url, "Reporting API configured");

    let admin_token = std::env::var("STAYBOARD_ADMIN_TOKEN").unwrap_or_default();
    if admin_token.is_empty() {
        warn!("STAYBOARD_ADMIN_TOKEN is not set; all authenticated endpoints will answer 403");
    }

    // ── 4. Shared state ──────────────────────────────────────────────────
    let state = Arc::new(AppState::new(settings, store, reporting, admin_token));

    // ── 5. API server ────────────────────────────────────────────────────
    let bind_addr =
        std::env::var("STAYBOARD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    // ── 6. Flush settings ────────────────────────────────────────────────
    if let Err(e) = state.settings().save(state.store.as_ref()) {
        error!(error = %format!("{e:#}"), "Failed to save settings on shutdown");
    }

    info!("Stayboard shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
