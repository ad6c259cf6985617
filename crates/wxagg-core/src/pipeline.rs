use async_trait::async_trait;

use crate::{CanonicalObservation, PartialObservation, Timestamp};

/// A weather data provider, invoked once per collection cycle.
///
/// Implementations never fail past this boundary: transport errors,
/// non-2xx responses and malformed payloads are folded into
/// [`PartialObservation::error`].
#[async_trait]
pub trait Source: Send + Sync {
    fn source_id(&self) -> &str;

    async fn fetch(&self) -> PartialObservation;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Keyed time-series store. Records are keyed by `(location, timestamp)`.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Idempotent upsert keyed by the record's location and timestamp
    async fn put(&self, record: &CanonicalObservation) -> Result<(), StoreError>;

    /// Records with `start <= timestamp <= end`, ascending by timestamp
    async fn query(
        &self,
        location: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<CanonicalObservation>, StoreError>;

    /// Record with the maximum timestamp
    async fn latest(&self, location: &str) -> Result<Option<CanonicalObservation>, StoreError>;

    /// Reachability check
    async fn ping(&self) -> Result<(), StoreError>;

    /// Drop records whose ttl has passed, returning how many were removed
    async fn purge_expired(&self, now: Timestamp) -> Result<u64, StoreError>;
}
