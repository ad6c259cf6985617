//! SQLite-backed store and connection management

use crate::schema::{CREATE_OBSERVATIONS, CREATE_TTL_INDEX};
use crate::{DbError, DbResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Observation store wrapping a sqlx SQLite pool
#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    /// Connect from a `sqlite:` URL and ensure the schema exists.
    ///
    /// In-memory databases are pinned to a single long-lived connection;
    /// every new connection would otherwise see an empty database.
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        if !database_url.starts_with("sqlite:") {
            return Err(DbError::ConfigError(format!(
                "unsupported store url: {}",
                database_url
            )));
        }

        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let pool_opts = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_opts
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url = %database_url, "observation store ready");
        Ok(store)
    }

    /// Create tables and indexes if they are missing
    pub async fn migrate(&self) -> DbResult<()> {
        sqlx::query(CREATE_OBSERVATIONS).execute(&self.pool).await?;
        sqlx::query(CREATE_TTL_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Get reference to underlying pool for direct queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(self) {
        self.pool.close().await;
    }
}
