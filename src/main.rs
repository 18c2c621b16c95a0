// =============================================================================
// Profit Chart — Main Entry Point
// =============================================================================
//
// Loads the primary series and the transaction log, binds them to the chart
// session, and serves the chart over HTTP until Ctrl+C. A source that cannot
// be loaded aborts startup; the chart is never served from partial data.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod engine;
mod error;
mod indicators;
mod overlay;
mod render;
mod runtime_config;
mod series;
mod session;
mod source;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::engine::IndicatorPipeline;
use crate::runtime_config::ChartConfig;
use crate::session::ChartSession;
use crate::source::DataClient;

const CONFIG_PATH: &str = "chart_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Profit Chart — starting up");

    let mut config = ChartConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        let defaults = ChartConfig::default();
        if !std::path::Path::new(CONFIG_PATH).exists() {
            if let Err(e) = defaults.save(CONFIG_PATH) {
                warn!(error = %e, "failed to write default config");
            }
        }
        defaults
    });
    config.apply_env_overrides();

    info!(
        series = %config.series,
        profit_source = %config.profit_source,
        transaction_source = %config.transaction_source,
        "configured sources"
    );

    // ── 2. Load both sources ─────────────────────────────────────────────
    let client = DataClient::new(Duration::from_secs(config.fetch_timeout_secs))?;
    let data = client
        .load_chart_data(&config)
        .await
        .context("chart data could not be loaded")?;

    // ── 3. Bind the chart session ────────────────────────────────────────
    let session = ChartSession::new(IndicatorPipeline::new(), data, config.session_options())
        .context("failed to initialise chart session")?;

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, session));

    // ── 4. Serve until Ctrl+C ────────────────────────────────────────────
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C, serving until killed");
                std::future::pending::<()>().await;
            }
            warn!("shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("Profit Chart shut down complete.");
    Ok(())
}
