use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use herd_intake_core::store::ProfileStore;

use crate::config::Config;
use crate::kv_sqlite::SqliteBackend;
use crate::migrate;

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.storage.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Opens the profile store backed by the configured SQLite namespace.
///
/// The schema is created on the fly, so a store can be opened without
/// running `intake init` first.
pub async fn open_store(config: &Config) -> Result<ProfileStore<SqliteBackend>> {
    let pool = connect(config).await?;
    migrate::ensure_schema(&pool).await?;
    Ok(ProfileStore::open(SqliteBackend::new(pool), config.storage.namespace.clone()).await)
}
