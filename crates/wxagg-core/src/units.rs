//! Canonical units and the conversions adapters apply at their boundary
//!
//! Canonical units: Celsius, hPa, m/s, percent, meters.

use crate::types::Metric;

/// Unit of a canonical numeric metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Celsius,
    Hectopascal,
    MetersPerSecond,
    Percent,
    Meters,
    Degrees,
    Index,
}

impl Unit {
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Celsius => "celsius",
            Unit::Hectopascal => "hPa",
            Unit::MetersPerSecond => "m/s",
            Unit::Percent => "percent",
            Unit::Meters => "meters",
            Unit::Degrees => "degrees",
            Unit::Index => "index",
        }
    }
}

/// Get the canonical unit for a metric (`None` for categorical metrics)
pub fn unit_for(metric: Metric) -> Option<Unit> {
    match metric {
        Metric::Temperature | Metric::FeelsLike => Some(Unit::Celsius),
        Metric::Pressure => Some(Unit::Hectopascal),
        Metric::WindSpeed => Some(Unit::MetersPerSecond),
        Metric::Humidity | Metric::Clouds => Some(Unit::Percent),
        Metric::Visibility => Some(Unit::Meters),
        Metric::WindDirection => Some(Unit::Degrees),
        Metric::UvIndex => Some(Unit::Index),
        Metric::WeatherDescription => None,
    }
}

/// km/h to m/s
pub fn kph_to_mps(value: f64) -> f64 {
    value / 3.6
}

/// Kilometers to meters
pub fn km_to_m(value: f64) -> f64 {
    value * 1000.0
}
