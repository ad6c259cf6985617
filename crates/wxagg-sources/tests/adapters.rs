use std::time::Duration;

use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxagg_core::{GeoPoint, Metric, Source};
use wxagg_sources::{Provider, SourceAdapter};

fn here() -> GeoPoint {
    GeoPoint {
        latitude: 33.0462,
        longitude: -96.9942,
    }
}

fn adapter(provider: Provider, key: Option<&str>, server: &MockServer) -> SourceAdapter {
    let client = SourceAdapter::http_client(Duration::from_secs(5)).unwrap();
    SourceAdapter::new(provider, key.map(str::to_string), here(), client)
        .unwrap()
        .with_base_url(server.uri())
}

#[tokio::test]
async fn openweathermap_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "owm-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": {"temp": 25.5, "feels_like": 26.1, "humidity": 65, "pressure": 1013},
            "wind": {"speed": 3.5, "deg": 180},
            "clouds": {"all": 20},
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "visibility": 10000,
            "dt": 1705320000
        })))
        .mount(&server)
        .await;

    let obs = adapter(Provider::OpenWeatherMap, Some("owm-key"), &server)
        .fetch()
        .await;
    assert_eq!(obs.source_id, "openweathermap");
    assert!(obs.error.is_none());
    assert_eq!(obs.fields[&Metric::Temperature].as_f64(), Some(25.5));
    assert_eq!(obs.fields[&Metric::Humidity].as_f64(), Some(65.0));
    assert_eq!(obs.fields[&Metric::WeatherDescription].as_str(), Some("Clear"));
    assert_eq!(obs.observed_at.map(|t| t.timestamp()), Some(1705320000));
}

#[tokio::test]
async fn non_2xx_is_captured_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401, "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let obs = adapter(Provider::OpenWeatherMap, Some("bad"), &server)
        .fetch()
        .await;
    assert!(obs.fields.is_empty());
    let err = obs.error.unwrap();
    assert!(err.contains("401"), "{}", err);
}

#[tokio::test]
async fn malformed_payload_is_captured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let obs = adapter(Provider::WeatherApi, Some("k"), &server).fetch().await;
    assert!(obs.fields.is_empty());
    assert!(obs.error.unwrap().starts_with("Invalid payload"));
}

#[tokio::test]
async fn weatherapi_converts_units() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "wa-key"))
        .and(query_param("q", "33.0462,-96.9942"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current": {
                "temp_c": 24.0, "feelslike_c": 24.5, "humidity": 70, "pressure_mb": 1012.0,
                "wind_kph": 15.0, "wind_degree": 200, "cloud": 50, "vis_km": 10.0, "uv": 6.0,
                "condition": {"text": "Partly cloudy"}
            }
        })))
        .mount(&server)
        .await;

    let obs = adapter(Provider::WeatherApi, Some("wa-key"), &server)
        .fetch()
        .await;
    assert!(obs.error.is_none());
    let speed = obs.fields[&Metric::WindSpeed].as_f64().unwrap();
    assert!((speed - 15.0 / 3.6).abs() < 1e-6);
    assert_eq!(obs.fields[&Metric::Visibility].as_f64(), Some(10_000.0));
}

#[tokio::test]
async fn openmeteo_requests_metric_wind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("wind_speed_unit", "ms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current": {
                "temperature_2m": 23.5, "relative_humidity_2m": 60, "apparent_temperature": 24.0,
                "weather_code": 2, "pressure_msl": 1015.0, "wind_speed_10m": 4.2,
                "wind_direction_10m": 90, "cloud_cover": 40
            }
        })))
        .mount(&server)
        .await;

    let obs = adapter(Provider::OpenMeteo, None, &server).fetch().await;
    assert!(obs.error.is_none());
    assert_eq!(obs.fields.len(), 8);
    assert_eq!(
        obs.fields[&Metric::WeatherDescription].as_str(),
        Some("Partly cloudy")
    );
}

#[tokio::test]
async fn visualcrossing_and_tomorrow_io() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/VisualCrossingWebServices/rest/services/timeline/.+/today$"))
        .and(query_param("unitGroup", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "currentConditions": {"temp": 22.0, "windspeed": 18.0, "conditions": "Clear"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/weather/realtime"))
        .and(query_param("apikey", "tio-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"values": {"temperature": 21.0, "weatherCode": 1001}}
        })))
        .mount(&server)
        .await;

    let vc = adapter(Provider::VisualCrossing, Some("vc-key"), &server)
        .fetch()
        .await;
    assert!(vc.error.is_none(), "{:?}", vc.error);
    assert!((vc.fields[&Metric::WindSpeed].as_f64().unwrap() - 5.0).abs() < 1e-9);

    let tio = adapter(Provider::TomorrowIo, Some("tio-key"), &server)
        .fetch()
        .await;
    assert!(tio.error.is_none(), "{:?}", tio.error);
    assert_eq!(
        tio.fields[&Metric::WeatherDescription].as_str(),
        Some("Cloudy")
    );
}

#[tokio::test]
async fn payload_without_usable_fields_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"current": {}})),
        )
        .mount(&server)
        .await;

    let obs = adapter(Provider::OpenMeteo, None, &server).fetch().await;
    assert!(obs.fields.is_empty());
    assert!(obs.error.is_some());
}
