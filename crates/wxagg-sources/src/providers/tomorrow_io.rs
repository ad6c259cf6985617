//! Tomorrow.io realtime API (`/v4/weather/realtime`, metric units)

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use wxagg_core::{km_to_m, GeoPoint, Metric};

use super::{from_rfc3339, lat_lon};
use crate::codes::tomorrow_description;
use crate::provider::{FieldsBuilder, Reading};
use crate::SourceResult;

pub const BASE_URL: &str = "https://api.tomorrow.io";

pub(crate) fn request(client: &Client, base_url: &str, api_key: &str, at: GeoPoint) -> RequestBuilder {
    client
        .get(format!("{}/v4/weather/realtime", base_url))
        .query(&[
            ("location", lat_lon(at)),
            ("apikey", api_key.to_string()),
            ("units", "metric".to_string()),
        ])
}

#[derive(Debug, Deserialize)]
struct Response {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    time: Option<String>,
    values: Values,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Values {
    temperature: Option<f64>,
    temperature_apparent: Option<f64>,
    humidity: Option<f64>,
    pressure_surface_level: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    cloud_cover: Option<f64>,
    visibility: Option<f64>,
    uv_index: Option<f64>,
    weather_code: Option<i64>,
}

pub(crate) fn normalize(body: &[u8]) -> SourceResult<Reading> {
    let resp: Response = serde_json::from_slice(body)?;
    let observed_at = from_rfc3339(resp.data.time.as_deref());
    let v = resp.data.values;
    let mut f = FieldsBuilder::default();
    f.number(Metric::Temperature, v.temperature)
        .number(Metric::FeelsLike, v.temperature_apparent)
        .number(Metric::Humidity, v.humidity)
        .number(Metric::Pressure, v.pressure_surface_level)
        .number(Metric::WindSpeed, v.wind_speed)
        .number(Metric::WindDirection, v.wind_direction)
        .number(Metric::Clouds, v.cloud_cover)
        .number(Metric::Visibility, v.visibility.map(km_to_m))
        .number(Metric::UvIndex, v.uv_index)
        .text(
            Metric::WeatherDescription,
            v.weather_code.map(tomorrow_description),
        )
        .observed_at(observed_at);
    Ok(f.finish())
}
