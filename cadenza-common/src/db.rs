//! Database pool initialization
//!
//! Services own their schema; this module only bootstraps the connection
//! pool against a SQLite file that may not exist yet.

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize a SQLite connection pool, creating the database file and any
/// missing parent directories.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    Ok(pool)
}
