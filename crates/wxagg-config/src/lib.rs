use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    pub id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CollectorConfig {
    pub interval_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    /// JSON object `{ "<provider id>": "<api key>" }`
    pub api_keys_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityConfig {
    pub coverage_weight: Option<f64>,
    pub completeness_weight: Option<f64>,
    pub freshness_weight: Option<f64>,
    pub expected_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceConfig {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthConfig {
    pub freshness_threshold_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub location: Option<LocationConfig>,
    pub store: Option<StoreConfig>,
    pub collector: Option<CollectorConfig>,
    pub quality: Option<QualityConfig>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    pub http: Option<HttpConfig>,
    pub health: Option<HealthConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid API key file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub const DEFAULT_LOCATION: &str = "lewisville-tx";
pub const DEFAULT_LATITUDE: f64 = 33.0462;
pub const DEFAULT_LONGITUDE: f64 = -96.9942;

impl AppConfig {
    /// Load configuration from WXAGG_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WXAGG_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(path)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Location identifier (partition key)
    pub fn location_id(&self) -> String {
        self.location
            .as_ref()
            .and_then(|l| l.id.clone())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
    }

    /// (latitude, longitude)
    pub fn coordinates(&self) -> (f64, f64) {
        let loc = self.location.as_ref();
        (
            loc.and_then(|l| l.latitude).unwrap_or(DEFAULT_LATITUDE),
            loc.and_then(|l| l.longitude).unwrap_or(DEFAULT_LONGITUDE),
        )
    }

    pub fn store_url(&self) -> String {
        self.store
            .as_ref()
            .and_then(|s| s.url.clone())
            .unwrap_or_else(|| "sqlite://wxagg.db?mode=rwc".to_string())
    }

    pub fn retention_days(&self) -> u32 {
        self.store
            .as_ref()
            .and_then(|s| s.retention_days)
            .unwrap_or(30)
    }

    /// Collection cycle interval (default 20 minutes)
    pub fn interval_secs(&self) -> u64 {
        self.collector
            .as_ref()
            .and_then(|c| c.interval_secs)
            .unwrap_or(1200)
    }

    /// Per-adapter deadline within a cycle
    pub fn fetch_timeout_secs(&self) -> u64 {
        self.collector
            .as_ref()
            .and_then(|c| c.fetch_timeout_secs)
            .unwrap_or(15)
    }

    pub fn http_timeout_secs(&self) -> u64 {
        self.collector
            .as_ref()
            .and_then(|c| c.http_timeout_secs)
            .unwrap_or(10)
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.http
            .as_ref()
            .and_then(|h| h.bind.clone())
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
    }

    /// Age past which the latest observation is stale (default 30 minutes)
    pub fn freshness_threshold_secs(&self) -> u64 {
        self.health
            .as_ref()
            .and_then(|h| h.freshness_threshold_secs)
            .unwrap_or(1800)
    }

    pub fn quality(&self) -> QualityConfig {
        self.quality.clone().unwrap_or_default()
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.get(id)
    }

    pub fn source_enabled(&self, id: &str) -> bool {
        self.source(id).and_then(|s| s.enabled).unwrap_or(true)
    }

    /// Resolve an API key: env `WXAGG_<ID>_API_KEY`, then `[sources.<id>]`, then the key file.
    /// `env` looks up environment variables.
    pub fn api_key_with<F>(&self, id: &str, env: F) -> Result<Option<String>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = format!("WXAGG_{}_API_KEY", id.to_ascii_uppercase());
        if let Some(key) = env(&var).filter(|k| !k.is_empty()) {
            return Ok(Some(key));
        }
        if let Some(key) = self
            .source(id)
            .and_then(|s| s.api_key.clone())
            .filter(|k| !k.is_empty())
        {
            return Ok(Some(key));
        }
        let file = self.collector.as_ref().and_then(|c| c.api_keys_file.as_ref());
        match file {
            Some(path) if Path::new(path).exists() => {
                let s = fs::read_to_string(path)?;
                let keys: BTreeMap<String, String> = serde_json::from_str(&s)?;
                Ok(keys.get(id).filter(|k| !k.is_empty()).cloned())
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http_bind(), "0.0.0.0:8080");
        assert_eq!(cfg.location_id(), "lewisville-tx");
        assert_eq!(cfg.coordinates(), (33.0462, -96.9942));
        assert_eq!(cfg.retention_days(), 30);
        assert_eq!(cfg.interval_secs(), 1200);
        assert_eq!(cfg.fetch_timeout_secs(), 15);
        assert_eq!(cfg.freshness_threshold_secs(), 1800);
        assert!(cfg.source_enabled("openmeteo"));
    }

    #[test]
    fn parses_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [location]
            id = "denver-co"
            latitude = 39.74
            longitude = -104.99

            [collector]
            interval_secs = 600

            [sources.openweathermap]
            api_key = "owm-key"

            [sources.tomorrow_io]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.location_id(), "denver-co");
        assert_eq!(cfg.coordinates(), (39.74, -104.99));
        assert_eq!(cfg.interval_secs(), 600);
        assert!(!cfg.source_enabled("tomorrow_io"));
        assert_eq!(
            cfg.api_key_with("openweathermap", |_| None).unwrap(),
            Some("owm-key".to_string())
        );
    }

    #[test]
    fn env_key_wins() {
        let mut cfg = AppConfig::default();
        cfg.sources.insert(
            "weatherapi".into(),
            SourceConfig {
                api_key: Some("from-file".into()),
                ..Default::default()
            },
        );
        let key = cfg
            .api_key_with("weatherapi", |name| {
                (name == "WXAGG_WEATHERAPI_API_KEY").then(|| "from-env".to_string())
            })
            .unwrap();
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[test]
    fn key_file_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(&path, r#"{"visualcrossing": "vc-key", "weatherapi": ""}"#).unwrap();
        let cfg = AppConfig {
            collector: Some(CollectorConfig {
                api_keys_file: Some(path.display().to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            cfg.api_key_with("visualcrossing", |_| None).unwrap(),
            Some("vc-key".to_string())
        );
        assert_eq!(cfg.api_key_with("weatherapi", |_| None).unwrap(), None);
        assert_eq!(cfg.api_key_with("tomorrow_io", |_| None).unwrap(), None);
    }

    #[test]
    fn missing_file_is_default() {
        let cfg = AppConfig::load_from("/nonexistent/wxagg.toml").unwrap();
        assert_eq!(cfg.location_id(), DEFAULT_LOCATION);
    }
}
