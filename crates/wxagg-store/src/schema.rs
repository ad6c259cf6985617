//! Row layout for the observations table
//!
//! `(location, ts)` is the primary key. The full canonical record is kept
//! as JSON in `record`; `ts` and `ttl` are broken out for range queries and
//! purging.

use crate::DbResult;
use sqlx::FromRow;
use wxagg_core::CanonicalObservation;

/// Observations table row
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct ObservationRow {
    pub location: String,

    /// Unix epoch seconds of the cycle timestamp
    pub ts: i64,

    /// Unix epoch seconds after which the row may be purged
    pub ttl: i64,

    /// JSON-encoded `CanonicalObservation`
    pub record: String,
}

impl ObservationRow {
    pub fn from_record(record: &CanonicalObservation) -> DbResult<Self> {
        Ok(Self {
            location: record.location.clone(),
            ts: record.timestamp.timestamp(),
            ttl: record.ttl,
            record: serde_json::to_string(record)?,
        })
    }

    pub fn into_record(self) -> DbResult<CanonicalObservation> {
        Ok(serde_json::from_str(&self.record)?)
    }
}

pub(crate) const CREATE_OBSERVATIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS observations (
        location TEXT NOT NULL,
        ts INTEGER NOT NULL,
        ttl INTEGER NOT NULL,
        record TEXT NOT NULL,
        PRIMARY KEY (location, ts)
    )
"#;

pub(crate) const CREATE_TTL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS observations_ttl ON observations (ttl)";
