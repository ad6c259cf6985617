//! Time-series store implementations for canonical observations
//!
//! [`SqlStore`] persists to SQLite through sqlx; [`MemoryStore`] keeps
//! everything in process. Both upsert on `(location, timestamp)`.

pub mod client;
pub mod memory;
pub mod queries;
pub mod schema;

pub use client::*;
pub use memory::*;
pub use schema::*;

use thiserror::Error;
use wxagg_core::StoreError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Record encoding error: {0}")]
    EncodingError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::EncodingError(e) => StoreError::Corrupt(e.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}
