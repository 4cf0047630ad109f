//! Song catalogue interface
//!
//! Narrow contract over durable metadata: song lookup and creation, the
//! append-only recognition log, user-scoped history, and aggregate stats.

use async_trait::async_trait;
use cadenza_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::db::recognition_log::{NewLogEntry, RecognitionLogEntry};
use crate::db::songs::SongRecord;
use crate::models::{RecognitionStats, SongMetadata};

#[async_trait]
pub trait SongCatalogue: Send + Sync {
    async fn get_song(&self, song_id: Uuid) -> Result<Option<SongRecord>>;

    /// Insert a song under a fresh UUID and return it
    async fn create_song(&self, metadata: &SongMetadata) -> Result<Uuid>;

    /// Returns whether a row existed
    async fn delete_song(&self, song_id: Uuid) -> Result<bool>;

    async fn log_recognition(
        &self,
        request_id: Uuid,
        user_id: Option<Uuid>,
        song_id: Uuid,
        confidence: f32,
        processing_time_ms: u64,
    ) -> Result<()>;

    async fn log_recognition_error(
        &self,
        request_id: Uuid,
        user_id: Option<Uuid>,
        error: &str,
        processing_time_ms: u64,
    ) -> Result<()>;

    /// History scoped to `user_id` server-side, newest first
    async fn get_recognition_history(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RecognitionLogEntry>>;

    /// Delete one history entry after verifying ownership
    async fn delete_recognition_history(&self, recognition_id: Uuid, user_id: Uuid)
        -> Result<bool>;

    async fn get_recognition_stats(&self) -> Result<RecognitionStats>;

    async fn health(&self) -> bool;
}

/// SQLite-backed catalogue
pub struct SqliteCatalogue {
    pool: SqlitePool,
}

impl SqliteCatalogue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SongCatalogue for SqliteCatalogue {
    async fn get_song(&self, song_id: Uuid) -> Result<Option<SongRecord>> {
        db::songs::get_song(&self.pool, song_id).await
    }

    async fn create_song(&self, metadata: &SongMetadata) -> Result<Uuid> {
        let song_id = Uuid::new_v4();
        db::songs::insert_song(&self.pool, song_id, metadata).await?;
        Ok(song_id)
    }

    async fn delete_song(&self, song_id: Uuid) -> Result<bool> {
        db::songs::delete_song(&self.pool, song_id).await
    }

    async fn log_recognition(
        &self,
        request_id: Uuid,
        user_id: Option<Uuid>,
        song_id: Uuid,
        confidence: f32,
        processing_time_ms: u64,
    ) -> Result<()> {
        db::recognition_log::append_entry(
            &self.pool,
            &NewLogEntry {
                request_id,
                user_id,
                song_id: Some(song_id),
                confidence: Some(confidence as f64),
                processing_time_ms,
                error: None,
            },
        )
        .await
    }

    async fn log_recognition_error(
        &self,
        request_id: Uuid,
        user_id: Option<Uuid>,
        error: &str,
        processing_time_ms: u64,
    ) -> Result<()> {
        db::recognition_log::append_entry(
            &self.pool,
            &NewLogEntry {
                request_id,
                user_id,
                song_id: None,
                confidence: None,
                processing_time_ms,
                error: Some(error.to_string()),
            },
        )
        .await
    }

    async fn get_recognition_history(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RecognitionLogEntry>> {
        db::recognition_log::fetch_history(&self.pool, user_id, limit, offset).await
    }

    async fn delete_recognition_history(
        &self,
        recognition_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool> {
        db::recognition_log::delete_entry(&self.pool, recognition_id, user_id).await
    }

    async fn get_recognition_stats(&self) -> Result<RecognitionStats> {
        db::recognition_log::stats(&self.pool).await
    }

    async fn health(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
