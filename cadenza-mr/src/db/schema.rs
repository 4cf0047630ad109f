//! Database schema initialization

use cadenza_common::Result;
use sqlx::SqlitePool;

/// Create all tables and indexes if they do not exist.
///
/// `recognition_log.song_id` deliberately carries no foreign key: the log is
/// append-only and entries outlive song deletion.
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT,
            genre TEXT,
            language TEXT,
            duration REAL,
            release_date TEXT,
            popularity_score REAL NOT NULL DEFAULT 0.0,
            spotify_id TEXT,
            youtube_id TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recognition_log (
            guid TEXT PRIMARY KEY,
            request_id TEXT NOT NULL,
            user_id TEXT,
            song_id TEXT,
            confidence REAL,
            processing_time_ms INTEGER NOT NULL,
            error TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recognition_log_user
         ON recognition_log(user_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
