//! Interval-driven collection cycles

use chrono::Utc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use wxagg_aggregate::{Collector, CycleResult};
use wxagg_core::{format_iso, CanonicalObservation, Timestamp};

/// Runs a collection cycle every `interval`, purging expired rows after each
pub struct Scheduler {
    collector: Collector,
    interval: Duration,
    cycles: u64,
    failures: u64,
}

impl Scheduler {
    pub fn new(collector: Collector, interval: Duration) -> Self {
        Self {
            collector,
            interval,
            cycles: 0,
            failures: 0,
        }
    }

    /// Loop forever; the first cycle starts immediately. Cycle failures
    /// are logged and retried at the next tick.
    pub async fn run(&mut self) {
        info!(
            interval_secs = self.interval.as_secs(),
            sources = self.collector.source_count(),
            location = self.collector.location(),
            "Scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cycle(Utc::now()).await {
                warn!(error = %e, "cycle failed, retrying next interval");
            }
        }
    }

    /// One cycle followed by a retention purge
    pub async fn run_cycle(&mut self, now: Timestamp) -> CycleResult<CanonicalObservation> {
        self.cycles += 1;
        let result = self.collector.run_cycle(now).await;
        match &result {
            Ok(record) => info!(
                timestamp = %format_iso(&record.timestamp),
                sources = ?record.sources,
                quality_score = record.quality_score,
                "cycle complete"
            ),
            Err(_) => self.failures += 1,
        }

        match self.collector.store().purge_expired(now).await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "expired observations purged"),
            Err(e) => warn!(error = %e, "retention purge failed"),
        }
        result
    }

    pub fn stop(&self) {
        info!(
            cycles = self.cycles,
            failures = self.failures,
            "Scheduler stopped"
        );
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}
