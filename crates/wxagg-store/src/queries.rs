//! Store contract over the observations table

use crate::schema::ObservationRow;
use crate::{DbResult, SqlStore};
use async_trait::async_trait;
use sqlx::Row;
use tracing::{debug, instrument};
use wxagg_core::{ceil_to_seconds, CanonicalObservation, ObservationStore, StoreError, Timestamp};

impl SqlStore {
    /// Insert or overwrite the row for `(location, ts)`
    #[instrument(skip(self, record), fields(location = %record.location, ts = record.timestamp.timestamp()))]
    pub async fn upsert_observation(&self, record: &CanonicalObservation) -> DbResult<()> {
        let row = ObservationRow::from_record(record)?;
        sqlx::query(
            r#"
            INSERT INTO observations (location, ts, ttl, record)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (location, ts) DO UPDATE SET
                ttl = excluded.ttl,
                record = excluded.record
            "#,
        )
        .bind(&row.location)
        .bind(row.ts)
        .bind(row.ttl)
        .bind(&row.record)
        .execute(self.pool())
        .await?;

        debug!("Upserted observation for timestamp {}", row.ts);
        Ok(())
    }

    /// Get observations within a time range, oldest first
    #[instrument(skip(self))]
    pub async fn get_observation_range(
        &self,
        location: &str,
        start_time: i64,
        end_time: i64,
    ) -> DbResult<Vec<CanonicalObservation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT location, ts, ttl, record FROM observations
            WHERE location = ? AND ts >= ? AND ts <= ?
            ORDER BY ts ASC
            "#,
        )
        .bind(location)
        .bind(start_time)
        .bind(end_time)
        .fetch_all(self.pool())
        .await?;

        debug!(
            "Retrieved {} observations between {} and {}",
            rows.len(),
            start_time,
            end_time
        );
        rows.into_iter().map(ObservationRow::into_record).collect()
    }

    /// Get the most recent observation
    #[instrument(skip(self))]
    pub async fn get_latest_observation(
        &self,
        location: &str,
    ) -> DbResult<Option<CanonicalObservation>> {
        let row = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT location, ts, ttl, record FROM observations
            WHERE location = ?
            ORDER BY ts DESC
            LIMIT 1
            "#,
        )
        .bind(location)
        .fetch_optional(self.pool())
        .await?;

        row.map(ObservationRow::into_record).transpose()
    }

    /// Get count of stored observations for a location
    #[instrument(skip(self))]
    pub async fn count_observations(&self, location: &str) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM observations WHERE location = ?")
            .bind(location)
            .fetch_one(self.pool())
            .await?;

        Ok(row.get("count"))
    }

    /// Delete observations whose ttl is before the timestamp
    #[instrument(skip(self))]
    pub async fn delete_expired_before(&self, timestamp: i64) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM observations WHERE ttl < ?")
            .bind(timestamp)
            .execute(self.pool())
            .await?;

        let deleted = result.rows_affected();
        debug!("Deleted {} expired observations before {}", deleted, timestamp);
        Ok(deleted)
    }
}

#[async_trait]
impl ObservationStore for SqlStore {
    async fn put(&self, record: &CanonicalObservation) -> Result<(), StoreError> {
        Ok(self.upsert_observation(record).await?)
    }

    async fn query(
        &self,
        location: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<CanonicalObservation>, StoreError> {
        Ok(self
            .get_observation_range(location, ceil_to_seconds(start).timestamp(), end.timestamp())
            .await?)
    }

    async fn latest(&self, location: &str) -> Result<Option<CanonicalObservation>, StoreError> {
        Ok(self.get_latest_observation(location).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        Ok(self.delete_expired_before(now.timestamp()).await?)
    }
}
