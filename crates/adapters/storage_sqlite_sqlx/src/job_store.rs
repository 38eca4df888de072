//! `SQLite` implementation of [`JobStore`].

use sqlx::SqlitePool;

use heatsoak_app::ports::JobStore;
use heatsoak_domain::error::SoakError;
use heatsoak_domain::time::now;

use crate::error::StorageError;

const UPSERT: &str = r"
    INSERT INTO kv_store (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

const SELECT_VALUE: &str = "SELECT value FROM kv_store WHERE key = ?";
const SELECT_KEYS: &str = "SELECT key FROM kv_store ORDER BY key";
const DELETE_BY_KEY: &str = "DELETE FROM kv_store WHERE key = ?";

/// `SQLite`-backed key/value store holding job records and the daily summary.
#[derive(Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl JobStore for SqliteJobStore {
    async fn put(&self, key: &str, value: String) -> Result<(), SoakError> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SoakError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_VALUE)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|(value,)| value))
    }

    async fn delete(&self, key: &str) -> Result<(), SoakError> {
        sqlx::query(DELETE_BY_KEY)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn iterate_keys(&self) -> Result<Vec<String>, SoakError> {
        let rows: Vec<(String,)> = sqlx::query_as(SELECT_KEYS)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}
