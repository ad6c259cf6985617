//! Service health derived from store reachability and data freshness

use serde::Serialize;
use wxagg_core::{iso_seconds, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(with = "iso_seconds")]
    pub checked_at: Timestamp,
    pub store_reachable: bool,
    #[serde(with = "iso_seconds::option")]
    pub last_update: Option<Timestamp>,
    pub is_fresh: bool,
}
