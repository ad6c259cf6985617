//! One collection cycle: fan out, merge, persist

use chrono::Duration as RetentionPeriod;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use wxagg_core::{CanonicalObservation, ObservationStore, Source, Timestamp};

use crate::{fetch_all, Aggregator, CycleResult, QualityPolicy};

/// Settings a collector is built from
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub location: String,
    pub policy: QualityPolicy,
    pub retention: RetentionPeriod,
    /// Per-source fetch deadline
    pub fetch_timeout: Duration,
}

/// Runs collection cycles against a fixed source set and store
pub struct Collector {
    sources: Vec<Arc<dyn Source>>,
    aggregator: Aggregator,
    store: Arc<dyn ObservationStore>,
    fetch_timeout: Duration,
}

impl Collector {
    pub fn new(
        sources: Vec<Arc<dyn Source>>,
        store: Arc<dyn ObservationStore>,
        settings: CycleSettings,
    ) -> Self {
        let aggregator = Aggregator::new(settings.location, sources.len(), settings.policy)
            .with_retention(settings.retention);
        Self {
            sources,
            aggregator,
            store,
            fetch_timeout: settings.fetch_timeout,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn location(&self) -> &str {
        self.aggregator.location()
    }

    pub fn store(&self) -> &Arc<dyn ObservationStore> {
        &self.store
    }

    /// Run one cycle at `now`; exactly one record is written on success
    /// and none on failure
    #[instrument(skip(self), fields(location = self.aggregator.location()))]
    pub async fn run_cycle(&self, now: Timestamp) -> CycleResult<CanonicalObservation> {
        let partials = fetch_all(&self.sources, self.fetch_timeout).await;

        let record = self.aggregator.aggregate(&partials, now).map_err(|failure| {
            for f in &failure.failures {
                error!(source = %f.source_id, reason = %f.reason, "source excluded");
            }
            error!(attempted = failure.attempted, "collection failed, nothing written");
            failure
        })?;

        if let Err(e) = self.store.put(&record).await {
            error!(error = %e, "failed to persist observation");
            return Err(e.into());
        }

        info!(
            sources = record.sources.len(),
            configured = self.sources.len(),
            quality = record.quality_score,
            "observation stored"
        );
        Ok(record)
    }
}
