//! Core data types for weather observations

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::units::Unit;

/// Timestamp type (UTC, second precision once canonical)
pub type Timestamp = DateTime<Utc>;

/// Canonical metric set produced by every adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    FeelsLike,
    Humidity,
    Pressure,
    WindSpeed,
    WindDirection,
    Clouds,
    Visibility,
    UvIndex,
    WeatherDescription,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::Temperature,
        Metric::FeelsLike,
        Metric::Humidity,
        Metric::Pressure,
        Metric::WindSpeed,
        Metric::WindDirection,
        Metric::Clouds,
        Metric::Visibility,
        Metric::UvIndex,
        Metric::WeatherDescription,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::FeelsLike => "feels_like",
            Metric::Humidity => "humidity",
            Metric::Pressure => "pressure",
            Metric::WindSpeed => "wind_speed",
            Metric::WindDirection => "wind_direction",
            Metric::Clouds => "clouds",
            Metric::Visibility => "visibility",
            Metric::UvIndex => "uv_index",
            Metric::WeatherDescription => "weather_description",
        }
    }

    /// Numeric metrics are averaged; the rest take a consensus string
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Metric::WeatherDescription)
    }

    pub fn unit(&self) -> Option<Unit> {
        crate::units::unit_for(*self)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reported field value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

/// Metric name -> reported value. Absent keys mean "not supplied".
pub type Fields = BTreeMap<Metric, FieldValue>;

/// One provider's contribution to one collection cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PartialObservation {
    pub source_id: String,
    pub fields: Fields,
    pub fetched_at: Timestamp,
    /// Provider-reported observation time, when the payload carries one
    pub observed_at: Option<Timestamp>,
    /// Set (with `fields` empty) when the provider call failed
    pub error: Option<String>,
}

impl PartialObservation {
    pub fn success(source_id: impl Into<String>, fields: Fields, fetched_at: Timestamp) -> Self {
        Self {
            source_id: source_id.into(),
            fields,
            fetched_at,
            observed_at: None,
            error: None,
        }
    }

    pub fn with_observed_at(mut self, observed_at: Option<Timestamp>) -> Self {
        self.observed_at = observed_at;
        self
    }

    pub fn failure(
        source_id: impl Into<String>,
        error: impl fmt::Display,
        fetched_at: Timestamp,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            fields: Fields::new(),
            fetched_at,
            observed_at: None,
            error: Some(error.to_string()),
        }
    }

    /// No error and at least one field
    pub fn is_contributing(&self) -> bool {
        self.error.is_none() && !self.fields.is_empty()
    }

    /// Age reference for freshness: the observation time, else the fetch time
    pub fn data_time(&self) -> Timestamp {
        self.observed_at.unwrap_or(self.fetched_at)
    }

    /// Fraction of the canonical metric set this source reported
    pub fn completeness(&self) -> f64 {
        self.fields.len() as f64 / Metric::ALL.len() as f64
    }
}

/// Mean and extrema of one numeric metric across contributing sources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericSummary {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Aggregated metric value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Numeric(NumericSummary),
    Categorical(String),
}

impl MetricValue {
    pub fn as_numeric(&self) -> Option<&NumericSummary> {
        match self {
            MetricValue::Numeric(n) => Some(n),
            MetricValue::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            MetricValue::Categorical(s) => Some(s),
            MetricValue::Numeric(_) => None,
        }
    }
}

/// The merged, quality-scored record persisted once per collection cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalObservation {
    /// Partition key
    pub location: String,

    /// Cycle time; sort key, unique per location
    #[serde(with = "iso_seconds")]
    pub timestamp: Timestamp,

    pub metrics: BTreeMap<Metric, MetricValue>,

    /// Contributing source ids in order of first appearance
    pub sources: Vec<String>,

    pub quality_score: f64,

    /// Expiry as Unix epoch seconds
    pub ttl: i64,
}

impl CanonicalObservation {
    pub fn numeric(&self, metric: Metric) -> Option<&NumericSummary> {
        self.metrics.get(&metric).and_then(MetricValue::as_numeric)
    }

    /// Point value (cross-source mean) of a numeric metric
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.numeric(metric).map(|n| n.value)
    }

    pub fn consensus(&self) -> Option<&str> {
        self.metrics
            .get(&Metric::WeatherDescription)
            .and_then(MetricValue::as_categorical)
    }
}

/// Geographic coordinates of the configured location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Drop sub-second precision
pub fn truncate_to_seconds(ts: Timestamp) -> Timestamp {
    ts.trunc_subsecs(0)
}

/// Round up to the next whole second when there is a fractional part
pub fn ceil_to_seconds(ts: Timestamp) -> Timestamp {
    let floor = ts.trunc_subsecs(0);
    if floor == ts {
        ts
    } else {
        floor + chrono::Duration::seconds(1)
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_iso(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Serde adapter for second-precision ISO-8601 timestamps
pub mod iso_seconds {
    use super::{format_iso, truncate_to_seconds, Timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| truncate_to_seconds(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::super::{format_iso, Timestamp};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&format_iso(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] Timestamp);

            Option::<Wrapper>::deserialize(deserializer).map(|w| w.map(|Wrapper(ts)| ts))
        }
    }
}
