//! Visual Crossing timeline API, current conditions for today

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use wxagg_core::{km_to_m, kph_to_mps, GeoPoint, Metric};

use super::{from_epoch, lat_lon};
use crate::provider::{FieldsBuilder, Reading};
use crate::{SourceError, SourceResult};

pub const BASE_URL: &str = "https://weather.visualcrossing.com";

pub(crate) fn request(client: &Client, base_url: &str, api_key: &str, at: GeoPoint) -> RequestBuilder {
    client
        .get(format!(
            "{}/VisualCrossingWebServices/rest/services/timeline/{}/today",
            base_url,
            lat_lon(at)
        ))
        .query(&[
            ("key", api_key),
            ("unitGroup", "metric"),
            ("include", "current"),
        ])
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(rename = "currentConditions")]
    current_conditions: Option<Conditions>,
    #[serde(default)]
    days: Vec<Conditions>,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    #[serde(rename = "datetimeEpoch")]
    datetime_epoch: Option<i64>,
    temp: Option<f64>,
    feelslike: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
    windspeed: Option<f64>,
    winddir: Option<f64>,
    cloudcover: Option<f64>,
    visibility: Option<f64>,
    uvindex: Option<f64>,
    conditions: Option<String>,
}

pub(crate) fn normalize(body: &[u8]) -> SourceResult<Reading> {
    let resp: Response = serde_json::from_slice(body)?;
    // A day's epoch is its midnight, not an observation time
    let (c, observed_at) = match resp.current_conditions {
        Some(c) => {
            let at = from_epoch(c.datetime_epoch);
            (c, at)
        }
        None => {
            let day = resp.days.into_iter().next().ok_or_else(|| {
                SourceError::InvalidPayload("no current conditions or days".into())
            })?;
            (day, None)
        }
    };

    let mut f = FieldsBuilder::default();
    f.number(Metric::Temperature, c.temp)
        .number(Metric::FeelsLike, c.feelslike)
        .number(Metric::Humidity, c.humidity)
        .number(Metric::Pressure, c.pressure)
        .number(Metric::WindSpeed, c.windspeed.map(kph_to_mps))
        .number(Metric::WindDirection, c.winddir)
        .number(Metric::Clouds, c.cloudcover)
        .number(Metric::Visibility, c.visibility.map(km_to_m))
        .number(Metric::UvIndex, c.uvindex)
        .text(Metric::WeatherDescription, c.conditions.as_deref())
        .observed_at(observed_at);
    Ok(f.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_current_conditions() {
        let body = br#"{
            "currentConditions": {"temp": 22.0, "windspeed": 36.0, "visibility": 16.0,
                "conditions": "Clear", "datetimeEpoch": 1705320000},
            "days": [{"temp": 30.0, "datetimeEpoch": 1705298400}]
        }"#;
        let reading = normalize(body).unwrap();
        assert_eq!(reading.observed_at.map(|t| t.timestamp()), Some(1_705_320_000));
        let fields = reading.fields;
        assert_eq!(fields[&Metric::Temperature].as_f64(), Some(22.0));
        assert!((fields[&Metric::WindSpeed].as_f64().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(fields[&Metric::Visibility].as_f64(), Some(16_000.0));
    }

    #[test]
    fn falls_back_to_first_day() {
        let body = br#"{"days": [{"temp": 30.0, "conditions": "Partially cloudy", "datetimeEpoch": 1705298400}]}"#;
        let reading = normalize(body).unwrap();
        assert_eq!(reading.observed_at, None);
        let fields = reading.fields;
        assert_eq!(fields[&Metric::Temperature].as_f64(), Some(30.0));
        assert!(!fields.contains_key(&Metric::WindSpeed));
    }

    #[test]
    fn rejects_empty_timeline() {
        let err = normalize(br#"{"days": []}"#).unwrap_err();
        assert!(matches!(err, SourceError::InvalidPayload(_)));
    }
}
