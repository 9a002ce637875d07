//! SQLite Membership Store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::{MembershipStore, StorageError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS alert_membership (
    fingerprint TEXT PRIMARY KEY NOT NULL,
    marked_at INTEGER NOT NULL
)";

/// Membership store backed by a SQLite database.
///
/// The primary key on `fingerprint` makes `INSERT OR IGNORE` the atomic
/// check-and-set behind [`MembershipStore::mark`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and prepare the schema.
    ///
    /// `url` takes the sqlx form, e.g. `sqlite://alerts.db` or `sqlite::memory:`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::Setup(e.to_string()))?
            .create_if_missing(true);

        // Each connection to an in-memory database sees its own copy, and the
        // copy is gone once its connection closes: pin exactly one, forever
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        }
        .acquire_timeout(acquire_timeout);
        let max_connections = pool_options.get_max_connections();

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Setup(e.to_string()))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StorageError::Setup(e.to_string()))?;

        info!("Opened SQLite membership store at {} ({} connections)", url, max_connections);
        Ok(Self { pool })
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MembershipStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM alert_membership WHERE fingerprint = ?")
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn mark(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO alert_membership (fingerprint, marked_at) VALUES (?, ?)",
        )
        .bind(fingerprint)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        debug!("Mark {} (created: {})", fingerprint, created);
        Ok(created)
    }

    async fn clear(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM alert_membership WHERE fingerprint = ?")
            .bind(fingerprint)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        debug!("Clear {} (removed: {})", fingerprint, removed);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alert_membership")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
