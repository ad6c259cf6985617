//! The closed set of supported providers

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use wxagg_core::{FieldValue, Fields, GeoPoint, Metric, Timestamp};

use crate::providers::{openmeteo, openweathermap, tomorrow_io, visualcrossing, weatherapi};
use crate::SourceResult;

/// A supported weather data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenWeatherMap,
    WeatherApi,
    VisualCrossing,
    OpenMeteo,
    TomorrowIo,
}

impl Provider {
    /// Enumeration order; also the order adapters are registered in
    pub const ALL: [Provider; 5] = [
        Provider::OpenWeatherMap,
        Provider::WeatherApi,
        Provider::VisualCrossing,
        Provider::OpenMeteo,
        Provider::TomorrowIo,
    ];

    /// Stable source id
    pub fn id(&self) -> &'static str {
        match self {
            Provider::OpenWeatherMap => "openweathermap",
            Provider::WeatherApi => "weatherapi",
            Provider::VisualCrossing => "visualcrossing",
            Provider::OpenMeteo => "openmeteo",
            Provider::TomorrowIo => "tomorrow_io",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenWeatherMap => "OpenWeatherMap",
            Provider::WeatherApi => "WeatherAPI",
            Provider::VisualCrossing => "Visual Crossing",
            Provider::OpenMeteo => "Open-Meteo",
            Provider::TomorrowIo => "Tomorrow.io",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Provider::OpenWeatherMap => "Current weather, temperature, humidity, pressure, wind",
            Provider::WeatherApi => "Current conditions, air quality, astronomy data",
            Provider::VisualCrossing => "Detailed weather data, forecasts",
            Provider::OpenMeteo => "Weather forecasts, historical data",
            Provider::TomorrowIo => "Real-time weather, air quality",
        }
    }

    pub fn free_tier_limit(&self) -> &'static str {
        match self {
            Provider::OpenWeatherMap => "1000 calls/day",
            Provider::WeatherApi => "1 million calls/month",
            Provider::VisualCrossing => "1000 records/day",
            Provider::OpenMeteo => "Unlimited (no API key required)",
            Provider::TomorrowIo => "500 calls/day",
        }
    }

    pub fn requires_key(&self) -> bool {
        !matches!(self, Provider::OpenMeteo)
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenWeatherMap => openweathermap::BASE_URL,
            Provider::WeatherApi => weatherapi::BASE_URL,
            Provider::VisualCrossing => visualcrossing::BASE_URL,
            Provider::OpenMeteo => openmeteo::BASE_URL,
            Provider::TomorrowIo => tomorrow_io::BASE_URL,
        }
    }

    /// Build the current-conditions request for a location
    pub fn request(
        &self,
        client: &Client,
        base_url: &str,
        api_key: &str,
        at: GeoPoint,
    ) -> RequestBuilder {
        let base_url = base_url.trim_end_matches('/');
        match self {
            Provider::OpenWeatherMap => openweathermap::request(client, base_url, api_key, at),
            Provider::WeatherApi => weatherapi::request(client, base_url, api_key, at),
            Provider::VisualCrossing => visualcrossing::request(client, base_url, api_key, at),
            Provider::OpenMeteo => openmeteo::request(client, base_url, at),
            Provider::TomorrowIo => tomorrow_io::request(client, base_url, api_key, at),
        }
    }

    /// Translate a provider response body into canonical fields
    pub fn normalize(&self, body: &[u8]) -> SourceResult<Reading> {
        match self {
            Provider::OpenWeatherMap => openweathermap::normalize(body),
            Provider::WeatherApi => weatherapi::normalize(body),
            Provider::VisualCrossing => visualcrossing::normalize(body),
            Provider::OpenMeteo => openmeteo::normalize(body),
            Provider::TomorrowIo => tomorrow_io::normalize(body),
        }
    }

    pub fn info(&self, interval_secs: u64) -> SourceInfo {
        SourceInfo {
            name: self.display_name(),
            id: self.id(),
            description: self.description(),
            update_frequency: describe_interval(interval_secs),
            free_tier_limit: self.free_tier_limit(),
        }
    }
}

/// Catalog entry for a configured source
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceInfo {
    pub name: &'static str,
    pub id: &'static str,
    pub description: &'static str,
    pub update_frequency: String,
    pub free_tier_limit: &'static str,
}

/// "Every 20 minutes", "Every hour", ...
pub fn describe_interval(secs: u64) -> String {
    match secs {
        0 | 1 => "Every second".to_string(),
        60 => "Every minute".to_string(),
        3600 => "Every hour".to_string(),
        s if s % 3600 == 0 => format!("Every {} hours", s / 3600),
        s if s % 60 == 0 => format!("Every {} minutes", s / 60),
        s => format!("Every {} seconds", s),
    }
}

/// One normalised provider payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub fields: Fields,
    /// When the provider says the values were observed
    pub observed_at: Option<Timestamp>,
}

/// Collects provider values, skipping absent and non-finite ones
#[derive(Default)]
pub(crate) struct FieldsBuilder {
    fields: Fields,
    observed_at: Option<Timestamp>,
}

impl FieldsBuilder {
    pub(crate) fn number(&mut self, metric: Metric, value: Option<f64>) -> &mut Self {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.fields.insert(metric, FieldValue::Number(v));
        }
        self
    }

    pub(crate) fn text(&mut self, metric: Metric, value: Option<&str>) -> &mut Self {
        if let Some(s) = value.map(str::trim).filter(|s| !s.is_empty()) {
            self.fields.insert(metric, FieldValue::Text(s.to_string()));
        }
        self
    }

    pub(crate) fn observed_at(&mut self, at: Option<Timestamp>) -> &mut Self {
        self.observed_at = at;
        self
    }

    pub(crate) fn finish(self) -> Reading {
        Reading {
            fields: self.fields,
            observed_at: self.observed_at,
        }
    }
}
