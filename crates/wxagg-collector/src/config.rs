//! Daemon settings derived from the application configuration

use anyhow::{Context, Result};
use std::time::Duration;
use wxagg_aggregate::{CycleSettings, QualityPolicy};
use wxagg_config::AppConfig;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// sqlx connection URL of the observation store
    pub store_url: String,

    /// Time between collection cycles (default: 1200 = 20 minutes)
    pub interval: Duration,

    pub cycle: CycleSettings,
}

impl DaemonConfig {
    pub fn from_app(cfg: &AppConfig) -> Result<Self> {
        let interval_secs = cfg.interval_secs().max(1);
        let quality = cfg.quality();
        let defaults = QualityPolicy::default();
        let policy = QualityPolicy::new(
            quality.coverage_weight.unwrap_or(defaults.coverage_weight),
            quality
                .completeness_weight
                .unwrap_or(defaults.completeness_weight),
            quality.freshness_weight.unwrap_or(defaults.freshness_weight),
            Duration::from_secs(quality.expected_interval_secs.unwrap_or(interval_secs)),
        )
        .context("Invalid [quality] configuration")?;

        Ok(Self {
            store_url: cfg.store_url(),
            interval: Duration::from_secs(interval_secs),
            cycle: CycleSettings {
                location: cfg.location_id(),
                policy,
                retention: chrono::Duration::days(i64::from(cfg.retention_days())),
                fetch_timeout: Duration::from_secs(cfg.fetch_timeout_secs().max(1)),
            },
        })
    }
}
