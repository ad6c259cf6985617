//! WeatherAPI.com current conditions (`/v1/current.json`)

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use wxagg_core::{km_to_m, kph_to_mps, GeoPoint, Metric};

use super::{from_epoch, lat_lon};
use crate::provider::{FieldsBuilder, Reading};
use crate::SourceResult;

pub const BASE_URL: &str = "https://api.weatherapi.com";

pub(crate) fn request(client: &Client, base_url: &str, api_key: &str, at: GeoPoint) -> RequestBuilder {
    client
        .get(format!("{}/v1/current.json", base_url))
        .query(&[("key", api_key.to_string()), ("q", lat_lon(at))])
}

#[derive(Debug, Deserialize)]
struct Response {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    last_updated_epoch: Option<i64>,
    temp_c: Option<f64>,
    feelslike_c: Option<f64>,
    humidity: Option<f64>,
    pressure_mb: Option<f64>,
    wind_kph: Option<f64>,
    wind_degree: Option<f64>,
    cloud: Option<f64>,
    vis_km: Option<f64>,
    uv: Option<f64>,
    condition: Option<Condition>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: Option<String>,
}

pub(crate) fn normalize(body: &[u8]) -> SourceResult<Reading> {
    let Response { current: c } = serde_json::from_slice(body)?;
    let mut f = FieldsBuilder::default();
    f.number(Metric::Temperature, c.temp_c)
        .number(Metric::FeelsLike, c.feelslike_c)
        .number(Metric::Humidity, c.humidity)
        .number(Metric::Pressure, c.pressure_mb)
        .number(Metric::WindSpeed, c.wind_kph.map(kph_to_mps))
        .number(Metric::WindDirection, c.wind_degree)
        .number(Metric::Clouds, c.cloud)
        .number(Metric::Visibility, c.vis_km.map(km_to_m))
        .number(Metric::UvIndex, c.uv)
        .text(
            Metric::WeatherDescription,
            c.condition.as_ref().and_then(|c| c.text.as_deref()),
        )
        .observed_at(from_epoch(c.last_updated_epoch));
    Ok(f.finish())
}
