use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use wxagg_query::QueryEngine;
use wxagg_sources::SourceRegistry;
use wxagg_store::SqlStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    wxagg_obs::init("wxagg-api");

    // Config
    let cfg = wxagg_config::AppConfig::load().context("Failed to load configuration")?;
    let http_bind = cfg.http_bind();

    // Store and catalog
    let store = SqlStore::connect(&cfg.store_url())
        .await
        .context("Failed to open observation store")?;
    let registry = SourceRegistry::from_config(&cfg).context("Failed to build source catalog")?;
    let engine = QueryEngine::new(Arc::new(store.clone()), cfg.location_id());
    let settings = wxagg_api::ApiSettings::from_config(&cfg, registry.catalog(cfg.interval_secs()));

    // Build app and state
    let (app, state) = wxagg_api::build_app(engine, settings)?;

    // Start HTTP server
    let addr: SocketAddr = http_bind
        .parse()
        .with_context(|| format!("Invalid HTTP bind address: {http_bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind TCP listener")?;

    // Mark ready just before serving
    wxagg_api::set_ready(&state, true);

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
        .context("HTTP server error")?;

    store.close().await;
    tracing::info!("HTTP server stopped");
    Ok(())
}
