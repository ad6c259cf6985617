//! HTTP adapter: one configured provider behind the `Source` capability

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use wxagg_core::{GeoPoint, PartialObservation, Source};

use crate::{Provider, Reading, SourceError, SourceResult};

/// A provider bound to a location, credentials, and an HTTP client
#[derive(Clone)]
pub struct SourceAdapter {
    provider: Provider,
    api_key: Option<String>,
    base_url: String,
    location: GeoPoint,
    client: Client,
}

impl SourceAdapter {
    /// Fails with `MissingApiKey` when the provider needs a key and none is given
    pub fn new(
        provider: Provider,
        api_key: Option<String>,
        location: GeoPoint,
        client: Client,
    ) -> SourceResult<Self> {
        if provider.requires_key() && api_key.is_none() {
            return Err(SourceError::MissingApiKey(provider.id()));
        }
        Ok(Self {
            provider,
            api_key,
            base_url: provider.default_base_url().to_string(),
            location,
            client,
        })
    }

    /// Point the adapter at a different host (mirrors, mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Shared client with a per-request deadline
    pub fn http_client(timeout: Duration) -> SourceResult<Client> {
        Ok(Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wxagg/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call the provider and normalise its payload
    pub async fn try_fetch(&self) -> SourceResult<Reading> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let response = self
            .provider
            .request(&self.client, &self.base_url, key, self.location)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let reading = self.provider.normalize(&body)?;
        if reading.fields.is_empty() {
            return Err(SourceError::InvalidPayload("no usable fields".into()));
        }
        Ok(reading)
    }
}

impl fmt::Debug for SourceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("location", &self.location)
            .finish()
    }
}

#[async_trait]
impl Source for SourceAdapter {
    fn source_id(&self) -> &str {
        self.provider.id()
    }

    #[instrument(skip(self), fields(source = self.provider.id()))]
    async fn fetch(&self) -> PartialObservation {
        let fetched_at = Utc::now();
        match self.try_fetch().await {
            Ok(Reading {
                fields,
                observed_at,
            }) => {
                debug!(fields = fields.len(), "provider fetch succeeded");
                PartialObservation::success(self.provider.id(), fields, fetched_at)
                    .with_observed_at(observed_at)
            }
            Err(e) => {
                warn!(source = self.provider.id(), error = %e, "provider fetch failed");
                PartialObservation::failure(self.provider.id(), e, fetched_at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> GeoPoint {
        GeoPoint {
            latitude: 33.0462,
            longitude: -96.9942,
        }
    }

    #[test]
    fn keyed_provider_requires_key() {
        let err = SourceAdapter::new(Provider::WeatherApi, None, here(), Client::new()).unwrap_err();
        assert!(matches!(err, SourceError::MissingApiKey("weatherapi")));
    }

    #[test]
    fn debug_hides_api_key() {
        let adapter =
            SourceAdapter::new(Provider::WeatherApi, Some("secret".into()), here(), Client::new())
                .unwrap();
        let dbg = format!("{:?}", adapter);
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn keyless_provider_builds() {
        let adapter = SourceAdapter::new(Provider::OpenMeteo, None, here(), Client::new()).unwrap();
        assert_eq!(adapter.source_id(), "openmeteo");
        assert_eq!(adapter.base_url(), "https://api.open-meteo.com");
    }

    #[tokio::test]
    async fn unreachable_host_becomes_error_observation() {
        let client = SourceAdapter::http_client(Duration::from_secs(2)).unwrap();
        let adapter = SourceAdapter::new(Provider::OpenMeteo, None, here(), client)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let obs = adapter.fetch().await;
        assert_eq!(obs.source_id, "openmeteo");
        assert!(obs.error.is_some());
        assert!(obs.fields.is_empty());
    }
}
