//! Connection pool for the favorites database.
//!
//! A paging session looks up favorite status for every item of every page
//! it loads, often while a toggle is writing. WAL journal mode lets those
//! lookups read the last committed state instead of waiting for the writer.
//! Writers are already serialized inside [`SqliteFavoriteStore`], so the
//! busy timeout only matters when another process holds the file.
//!
//! [`SqliteFavoriteStore`]: crate::sqlite_store::SqliteFavoriteStore

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;

/// Lookups from one session plus a toggle in flight; more buys nothing on
/// a single file.
const MAX_CONNECTIONS: u32 = 5;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the configured favorites database.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the
/// database cannot be opened.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open favorites database: {}", db_path.display()))?;

    Ok(pool)
}
