//! Per-provider request shapes and response normalisation

pub mod openmeteo;
pub mod openweathermap;
pub mod tomorrow_io;
pub mod visualcrossing;
pub mod weatherapi;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use wxagg_core::{GeoPoint, Timestamp};

pub(crate) fn lat_lon(at: GeoPoint) -> String {
    format!("{},{}", at.latitude, at.longitude)
}

pub(crate) fn from_epoch(secs: Option<i64>) -> Option<Timestamp> {
    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
}

pub(crate) fn from_rfc3339(s: Option<&str>) -> Option<Timestamp> {
    s.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Zone-less local time, requested in UTC
pub(crate) fn from_utc_minutes(s: Option<&str>) -> Option<Timestamp> {
    s.and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
