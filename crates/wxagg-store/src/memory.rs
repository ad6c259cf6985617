//! In-process store for tests and ephemeral runs

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use wxagg_core::{ceil_to_seconds, CanonicalObservation, ObservationStore, StoreError, Timestamp};

type Key = (String, i64);

/// Ordered map keyed by `(location, epoch seconds)`
pub struct MemoryStore {
    rows: RwLock<BTreeMap<Key, CanonicalObservation>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: every call fails with `StoreError::Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn put(&self, record: &CanonicalObservation) -> Result<(), StoreError> {
        self.check()?;
        let key = (record.location.clone(), record.timestamp.timestamp());
        self.rows.write().await.insert(key, record.clone());
        Ok(())
    }

    async fn query(
        &self,
        location: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<CanonicalObservation>, StoreError> {
        self.check()?;
        let (first, last) = (ceil_to_seconds(start).timestamp(), end.timestamp());
        if first > last {
            return Ok(Vec::new());
        }
        let lo = (location.to_string(), first);
        let hi = (location.to_string(), last);
        let rows = self.rows.read().await;
        Ok(rows.range(lo..=hi).map(|(_, r)| r.clone()).collect())
    }

    async fn latest(&self, location: &str) -> Result<Option<CanonicalObservation>, StoreError> {
        self.check()?;
        let rows = self.rows.read().await;
        let lo = (location.to_string(), i64::MIN);
        let hi = (location.to_string(), i64::MAX);
        Ok(rows.range(lo..=hi).next_back().map(|(_, r)| r.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        self.check()?;
        let cutoff = now.timestamp();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, r| r.ttl >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}
