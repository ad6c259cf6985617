//! Query engine: current, history and health

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use wxagg_core::{CanonicalObservation, ObservationStore, Timestamp};

use crate::{
    clamp_hours, HealthReport, HealthStatus, HistoryWindow, Period, QueryError, QueryResult,
};

/// Stateless reads for one configured location
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn ObservationStore>,
    location: String,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn ObservationStore>, location: impl Into<String>) -> Self {
        Self {
            store,
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Most recent observation; `NotFound` when nothing was ever stored
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn current(&self) -> QueryResult<CanonicalObservation> {
        self.store
            .latest(&self.location)
            .await?
            .ok_or_else(|| QueryError::NotFound(self.location.clone()))
    }

    /// Observations in `[now - hours, now]` with per-metric statistics.
    ///
    /// `hours` is clamped to `[1, 168]`. An empty window is a valid result.
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn history(&self, hours: i64, now: Timestamp) -> QueryResult<HistoryWindow> {
        let hours = clamp_hours(hours);
        let start = now - Duration::hours(hours);
        let observations = self.store.query(&self.location, start, now).await?;
        debug!(hours, points = observations.len(), "history window read");

        Ok(HistoryWindow::new(
            self.location.clone(),
            Period {
                start,
                end: now,
                hours,
            },
            observations,
        ))
    }

    /// Unhealthy when the store is unreachable; degraded when the newest
    /// observation is missing or older than `freshness_threshold`
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn health(&self, now: Timestamp, freshness_threshold: Duration) -> HealthReport {
        let latest = match self.store.ping().await {
            Ok(()) => self.store.latest(&self.location).await,
            Err(e) => Err(e),
        };

        let latest = match latest {
            Ok(latest) => latest,
            Err(e) => {
                warn!(error = %e, "store unreachable");
                return HealthReport {
                    status: HealthStatus::Unhealthy,
                    checked_at: now,
                    store_reachable: false,
                    last_update: None,
                    is_fresh: false,
                };
            }
        };

        let last_update = latest.map(|obs| obs.timestamp);
        let is_fresh = last_update.map_or(false, |ts| ts >= now - freshness_threshold);
        HealthReport {
            status: if is_fresh {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            checked_at: now,
            store_reachable: true,
            last_update,
            is_fresh,
        }
    }
}
