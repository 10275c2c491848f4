//! SQLite-backed [`KvBackend`] implementation.
//!
//! Each namespace key maps to one row of `kv_store`; a write replaces the
//! whole value, mirroring how browser local storage holds one string per key.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use herd_intake_core::store::KvBackend;

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KvBackend for SqliteBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::ensure_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn write_then_read_replaces_value() {
        let backend = SqliteBackend::new(memory_pool().await);
        assert_eq!(backend.read("profiles").await.unwrap(), None);
        backend.write("profiles", "[1]").await.unwrap();
        backend.write("profiles", "[2]").await.unwrap();
        assert_eq!(
            backend.read("profiles").await.unwrap().as_deref(),
            Some("[2]")
        );
    }

    #[tokio::test]
    async fn missing_table_surfaces_as_error() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let backend = SqliteBackend::new(pool);
        assert!(backend.write("profiles", "[]").await.is_err());
    }
}
