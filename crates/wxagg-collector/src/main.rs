//! wxagg collection daemon
//!
//! Fans out to the configured weather providers on a fixed interval,
//! merges their readings and writes one canonical observation per cycle.
//! `wxaggd --once` runs a single cycle and exits non-zero on failure.

mod config;
mod scheduler;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use wxagg_aggregate::Collector;
use wxagg_config::AppConfig;
use wxagg_core::ObservationStore;
use wxagg_sources::SourceRegistry;
use wxagg_store::SqlStore;

use crate::config::DaemonConfig;
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    wxagg_obs::init("wxaggd");

    let once = std::env::args().skip(1).any(|arg| arg == "--once");
    info!(once, "Starting wxagg collector");

    let app_config = AppConfig::load().context("Failed to load configuration")?;
    let config = DaemonConfig::from_app(&app_config)?;
    info!("Loaded configuration: {:?}", config);

    let store = SqlStore::connect(&config.store_url)
        .await
        .context("Failed to open observation store")?;
    store.ping().await.context("Store ping failed")?;
    info!("Observation store ready");

    let registry = SourceRegistry::from_config(&app_config).context("Failed to build sources")?;
    if registry.is_empty() {
        bail!("No weather sources configured");
    }

    let collector = Collector::new(
        registry.sources(),
        Arc::new(store.clone()),
        config.cycle.clone(),
    );
    let mut scheduler = Scheduler::new(collector, config.interval);

    if once {
        let result = scheduler.run_cycle(Utc::now()).await;
        store.close().await;
        let record = result.context("Collection cycle failed")?;
        info!(quality_score = record.quality_score, "Single cycle complete");
        return Ok(());
    }

    info!("Collector running - press Ctrl+C to stop");
    tokio::select! {
        _ = scheduler.run() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        }
    }
    scheduler.stop();
    store.close().await;

    info!("wxagg collector stopped");
    Ok(())
}
