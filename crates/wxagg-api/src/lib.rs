use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wxagg_config::AppConfig;
use wxagg_core::{format_iso, iso_seconds, CanonicalObservation, Metric, MetricValue, Timestamp};
use wxagg_query::{HealthStatus, QueryEngine, QueryError, DEFAULT_HISTORY_HOURS};
use wxagg_sources::{describe_interval, SourceInfo};

const ENDPOINTS: [&str; 7] = [
    "/health",
    "/weather/current",
    "/weather/history",
    "/weather/sources",
    "/healthz",
    "/readyz",
    "/metrics",
];

const AGGREGATION_METHOD: &str =
    "Mean of all contributing sources with min/max ranges; weather description by consensus";

/// Static settings echoed by the read API
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub freshness_threshold: chrono::Duration,
    pub update_interval_secs: u64,
    pub retention_days: i64,
    pub catalog: Vec<SourceInfo>,
}

impl ApiSettings {
    pub fn from_config(cfg: &AppConfig, catalog: Vec<SourceInfo>) -> Self {
        let (latitude, longitude) = cfg.coordinates();
        Self {
            location: cfg.location_id(),
            latitude,
            longitude,
            freshness_threshold: chrono::Duration::seconds(
                cfg.freshness_threshold_secs().min(u64::from(u32::MAX)) as i64,
            ),
            update_interval_secs: cfg.interval_secs(),
            retention_days: i64::from(cfg.retention_days()),
            catalog,
        }
    }
}

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    query_errors_total: Counter<u64>,
    engine: QueryEngine,
    settings: ApiSettings,
}

pub fn build_app(engine: QueryEngine, settings: ApiSettings) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter()
        .with_registry(registry.clone())
        .build()
        .context("failed to build prometheus exporter")?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("wxagg-api");

    let requests_total = meter
        .u64_counter("wxagg_requests_total")
        .with_description("Total HTTP requests served")
        .init();
    let query_errors_total = meter
        .u64_counter("wxagg_query_errors_total")
        .with_description("Read API requests that ended in an error")
        .init();

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        provider,
        requests_total,
        query_errors_total,
        engine,
        settings,
    });

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .route("/weather/current", get(current))
        .route("/weather/history", get(history))
        .route("/weather/sources", get(sources))
        .fallback(unknown_route)
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

/// `{"error": kind, "message": text}` with the matching status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                kind: e.kind(),
                message: e.to_string(),
            },
            QueryError::StoreUnavailable(ref inner) => {
                tracing::error!(error = %inner, "store unavailable");
                Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    kind: e.kind(),
                    message: "Observation store is unavailable".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"error": self.kind, "message": self.message})),
        )
            .into_response()
    }
}

impl AppState {
    fn count(&self, route: &'static str) {
        self.requests_total.add(1, &[KeyValue::new("route", route)]);
    }

    fn count_error(&self, err: &ApiError) {
        self.query_errors_total.add(1, &[KeyValue::new("kind", err.kind)]);
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> StatusCode {
    state.count("healthz");
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> ([(header::HeaderName, HeaderValue); 1], String) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

/// Numeric metrics carry their unit label in responses
#[derive(Serialize)]
#[serde(untagged)]
enum MetricView<'a> {
    Numeric {
        value: f64,
        min: f64,
        max: f64,
        count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<&'static str>,
    },
    Categorical(&'a str),
}

#[derive(Serialize)]
struct CurrentBody<'a> {
    location: &'a str,
    #[serde(with = "iso_seconds")]
    timestamp: Timestamp,
    metrics: BTreeMap<Metric, MetricView<'a>>,
    sources: &'a [String],
    quality_score: f64,
    ttl: i64,
}

impl<'a> CurrentBody<'a> {
    fn new(obs: &'a CanonicalObservation) -> Self {
        let metrics = obs
            .metrics
            .iter()
            .map(|(metric, value)| {
                let view = match value {
                    MetricValue::Numeric(n) => MetricView::Numeric {
                        value: n.value,
                        min: n.min,
                        max: n.max,
                        count: n.count,
                        unit: metric.unit().map(|u| u.label()),
                    },
                    MetricValue::Categorical(s) => MetricView::Categorical(s),
                };
                (*metric, view)
            })
            .collect();
        Self {
            location: &obs.location,
            timestamp: obs.timestamp,
            metrics,
            sources: &obs.sources,
            quality_score: obs.quality_score,
            ttl: obs.ttl,
        }
    }
}

async fn current(State(state): State<Arc<AppState>>) -> Response {
    state.count("current");
    match state.engine.current().await {
        Ok(obs) => (StatusCode::OK, Json(CurrentBody::new(&obs))).into_response(),
        Err(e) => {
            let err = ApiError::from(e);
            state.count_error(&err);
            err.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    hours: Option<i64>,
}

async fn history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Response {
    state.count("history");
    let hours = match params {
        Ok(Query(p)) => p.hours.unwrap_or(DEFAULT_HISTORY_HOURS),
        Err(rejection) => {
            let err = ApiError::bad_request(rejection.body_text());
            state.count_error(&err);
            return err.into_response();
        }
    };

    match state.engine.history(hours, Utc::now()).await {
        Ok(window) => (StatusCode::OK, Json(window)).into_response(),
        Err(e) => {
            let err = ApiError::from(e);
            state.count_error(&err);
            err.into_response()
        }
    }
}

async fn sources(State(state): State<Arc<AppState>>) -> Response {
    state.count("sources");
    let s = &state.settings;
    let body = json!({
        "location": {
            "id": s.location,
            "latitude": s.latitude,
            "longitude": s.longitude,
        },
        "sources": s.catalog,
        "aggregation_method": AGGREGATION_METHOD,
        "update_schedule": describe_interval(s.update_interval_secs),
        "data_retention": format!("{} days", s.retention_days),
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn unknown_route(State(state): State<Arc<AppState>>) -> Response {
    state.count("unknown");
    let body = json!({
        "error": "not_found",
        "message": "Endpoint not found",
        "available_endpoints": ENDPOINTS,
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    state.count("health");
    let report = state
        .engine
        .health(Utc::now(), state.settings.freshness_threshold)
        .await;

    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    let body = json!({
        "status": report.status.as_str(),
        "timestamp": format_iso(&report.checked_at),
        "location": state.engine.location(),
        "database": {
            "status": if report.store_reachable { "connected" } else { "disconnected" },
        },
        "data": {
            "last_update": report.last_update.as_ref().map(format_iso),
            "is_fresh": report.is_fresh,
        },
        "version": env!("CARGO_PKG_VERSION"),
    });
    (status, Json(body)).into_response()
}
