//! OpenWeatherMap current weather (`/data/2.5/weather`, metric units)

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use wxagg_core::{GeoPoint, Metric};

use super::from_epoch;
use crate::provider::{FieldsBuilder, Reading};
use crate::SourceResult;

pub const BASE_URL: &str = "https://api.openweathermap.org";

pub(crate) fn request(client: &Client, base_url: &str, api_key: &str, at: GeoPoint) -> RequestBuilder {
    client
        .get(format!("{}/data/2.5/weather", base_url))
        .query(&[
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("appid", api_key.to_string()),
            ("units", "metric".to_string()),
        ])
}

#[derive(Debug, Deserialize)]
struct Response {
    main: Main,
    wind: Option<Wind>,
    clouds: Option<Clouds>,
    visibility: Option<f64>,
    #[serde(default)]
    weather: Vec<Condition>,
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Clouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: Option<String>,
}

pub(crate) fn normalize(body: &[u8]) -> SourceResult<Reading> {
    let resp: Response = serde_json::from_slice(body)?;
    let mut f = FieldsBuilder::default();
    f.number(Metric::Temperature, resp.main.temp)
        .number(Metric::FeelsLike, resp.main.feels_like)
        .number(Metric::Humidity, resp.main.humidity)
        .number(Metric::Pressure, resp.main.pressure)
        .number(Metric::WindSpeed, resp.wind.as_ref().and_then(|w| w.speed))
        .number(Metric::WindDirection, resp.wind.as_ref().and_then(|w| w.deg))
        .number(Metric::Clouds, resp.clouds.and_then(|c| c.all))
        .number(Metric::Visibility, resp.visibility)
        .text(
            Metric::WeatherDescription,
            resp.weather.first().and_then(|c| c.main.as_deref()),
        )
        .observed_at(from_epoch(resp.dt));
    Ok(f.finish())
}
