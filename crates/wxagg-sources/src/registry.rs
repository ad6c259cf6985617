//! Adapter registry built from application configuration

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use wxagg_config::{AppConfig, ConfigError};
use wxagg_core::{GeoPoint, Source};

use crate::{Provider, SourceAdapter, SourceError, SourceInfo};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] SourceError),
}

/// The configured adapters, in provider enumeration order
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    adapters: Vec<SourceAdapter>,
}

impl SourceRegistry {
    pub fn new(adapters: Vec<SourceAdapter>) -> Self {
        Self { adapters }
    }

    /// Register every enabled provider that has the credentials it needs
    pub fn from_config(cfg: &AppConfig) -> Result<Self, RegistryError> {
        Self::from_config_with(cfg, |name| std::env::var(name).ok())
    }

    /// [`SourceRegistry::from_config`] with an injectable environment lookup
    pub fn from_config_with<F>(cfg: &AppConfig, env: F) -> Result<Self, RegistryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client = SourceAdapter::http_client(Duration::from_secs(cfg.http_timeout_secs()))?;
        let (latitude, longitude) = cfg.coordinates();
        let location = GeoPoint {
            latitude,
            longitude,
        };

        let mut adapters = Vec::new();
        for provider in Provider::ALL {
            let id = provider.id();
            if !cfg.source_enabled(id) {
                info!(source = id, "source disabled by configuration");
                continue;
            }
            let key = cfg.api_key_with(id, &env)?;
            let adapter = match SourceAdapter::new(provider, key, location, client.clone()) {
                Ok(adapter) => adapter,
                Err(e) => {
                    warn!(source = id, error = %e, "source not configured");
                    continue;
                }
            };
            let adapter = match cfg.source(id).and_then(|s| s.base_url.clone()) {
                Some(url) => adapter.with_base_url(url),
                None => adapter,
            };
            adapters.push(adapter);
        }

        info!(count = adapters.len(), "source registry built");
        Ok(Self { adapters })
    }

    pub fn adapters(&self) -> &[SourceAdapter] {
        &self.adapters
    }

    /// Adapters as shareable `Source` handles for the collector
    pub fn sources(&self) -> Vec<Arc<dyn Source>> {
        self.adapters
            .iter()
            .cloned()
            .map(|a| Arc::new(a) as Arc<dyn Source>)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Static catalog of the configured adapters
    pub fn catalog(&self, interval_secs: u64) -> Vec<SourceInfo> {
        self.adapters
            .iter()
            .map(|a| a.provider().info(interval_secs))
            .collect()
    }
}
