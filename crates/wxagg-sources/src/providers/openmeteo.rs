//! Open-Meteo forecast API, `current` block (no API key)

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use wxagg_core::{GeoPoint, Metric};

use super::from_utc_minutes;
use crate::codes::wmo_description;
use crate::provider::{FieldsBuilder, Reading};
use crate::SourceResult;

pub const BASE_URL: &str = "https://api.open-meteo.com";

const CURRENT_VARS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,pressure_msl,wind_speed_10m,wind_direction_10m,cloud_cover";

pub(crate) fn request(client: &Client, base_url: &str, at: GeoPoint) -> RequestBuilder {
    client.get(format!("{}/v1/forecast", base_url)).query(&[
        ("latitude", at.latitude.to_string()),
        ("longitude", at.longitude.to_string()),
        ("current", CURRENT_VARS.to_string()),
        ("wind_speed_unit", "ms".to_string()),
        ("timezone", "UTC".to_string()),
    ])
}

#[derive(Debug, Deserialize)]
struct Response {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    time: Option<String>,
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    pressure_msl: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    cloud_cover: Option<f64>,
    weather_code: Option<i64>,
}

pub(crate) fn normalize(body: &[u8]) -> SourceResult<Reading> {
    let Response { current: c } = serde_json::from_slice(body)?;
    let mut f = FieldsBuilder::default();
    f.number(Metric::Temperature, c.temperature_2m)
        .number(Metric::FeelsLike, c.apparent_temperature)
        .number(Metric::Humidity, c.relative_humidity_2m)
        .number(Metric::Pressure, c.pressure_msl)
        .number(Metric::WindSpeed, c.wind_speed_10m)
        .number(Metric::WindDirection, c.wind_direction_10m)
        .number(Metric::Clouds, c.cloud_cover)
        .text(Metric::WeatherDescription, c.weather_code.map(wmo_description))
        .observed_at(from_utc_minutes(c.time.as_deref()));
    Ok(f.finish())
}
