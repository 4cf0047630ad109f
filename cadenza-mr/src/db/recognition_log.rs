//! Append-only recognition log
//!
//! One row per recognition request: either a matched song with its
//! confidence, or the error that ended the request. History reads and
//! deletes are always scoped to the requesting user in SQL.

use cadenza_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::RecognitionStats;

/// A recognition log row
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionLogEntry {
    pub id: Uuid,
    pub request_id: Uuid,
    pub song_id: Option<Uuid>,
    pub confidence: Option<f64>,
    pub processing_time_ms: u64,
    pub error: Option<String>,
    pub timestamp: String,
}

/// New log row; `user_id` is absent for system-initiated requests
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub request_id: Uuid,
    pub user_id: Option<Uuid>,
    pub song_id: Option<Uuid>,
    pub confidence: Option<f64>,
    pub processing_time_ms: u64,
    pub error: Option<String>,
}

/// Append one log row
pub async fn append_entry(pool: &SqlitePool, entry: &NewLogEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recognition_log (
            guid, request_id, user_id, song_id, confidence,
            processing_time_ms, error, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(entry.request_id.to_string())
    .bind(entry.user_id.map(|id| id.to_string()))
    .bind(entry.song_id.map(|id| id.to_string()))
    .bind(entry.confidence)
    .bind(entry.processing_time_ms as i64)
    .bind(&entry.error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a user's recognition history, newest first
pub async fn fetch_history(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: u32,
    offset: u32,
) -> Result<Vec<RecognitionLogEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, request_id, song_id, confidence, processing_time_ms, error, created_at
        FROM recognition_log
        WHERE user_id = ?
        ORDER BY created_at DESC, guid DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_entry).collect()
}

/// Delete one history entry, but only if it belongs to `user_id`.
///
/// Returns whether a row was deleted. An entry owned by someone else reports
/// the same outcome as a missing id, so entry ids stay unguessable.
pub async fn delete_entry(pool: &SqlitePool, entry_id: Uuid, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM recognition_log WHERE guid = ? AND user_id = ?")
        .bind(entry_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Aggregate counts, match rate, and average latency over the whole log
pub async fn stats(pool: &SqlitePool) -> Result<RecognitionStats> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(CASE WHEN song_id IS NOT NULL THEN 1 ELSE 0 END), 0) AS matched,
               COALESCE(AVG(processing_time_ms), 0.0) AS avg_ms
        FROM recognition_log
        "#,
    )
    .fetch_one(pool)
    .await?;

    let total: i64 = row.get("total");
    let matched: i64 = row.get("matched");
    let avg_ms: f64 = row.get("avg_ms");

    Ok(RecognitionStats {
        total_recognitions: total as u64,
        matched: matched as u64,
        failed: (total - matched) as u64,
        match_rate: if total > 0 {
            matched as f64 / total as f64
        } else {
            0.0
        },
        avg_processing_time_ms: avg_ms,
    })
}

fn row_to_entry(row: sqlx::sqlite::SqliteRow) -> Result<RecognitionLogEntry> {
    let guid_str: String = row.get("guid");
    let request_id_str: String = row.get("request_id");
    let song_id_str: Option<String> = row.get("song_id");
    let processing_time_ms: i64 = row.get("processing_time_ms");

    Ok(RecognitionLogEntry {
        id: parse_uuid(&guid_str)?,
        request_id: parse_uuid(&request_id_str)?,
        song_id: song_id_str.as_deref().map(parse_uuid).transpose()?,
        confidence: row.get("confidence"),
        processing_time_ms: processing_time_ms.max(0) as u64,
        error: row.get("error"),
        timestamp: row.get("created_at"),
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| cadenza_common::Error::Internal(format!("Corrupt uuid in recognition_log: {}", e)))
}
