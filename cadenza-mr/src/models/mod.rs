//! API-facing data models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::songs::SongRecord;

/// Match type reported for vector-index recognitions
pub const MATCH_TYPE_VECTOR_SIMILARITY: &str = "vector_similarity";

/// Public projection of a catalogued song
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongInfo {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    /// Full song duration in seconds
    pub duration: Option<f64>,
    pub release_date: Option<String>,
    pub popularity_score: f64,
    pub spotify_id: Option<String>,
    pub youtube_id: Option<String>,
}

impl From<SongRecord> for SongInfo {
    fn from(song: SongRecord) -> Self {
        Self {
            id: song.guid,
            title: song.title,
            artist: song.artist,
            album: song.album,
            genre: song.genre,
            language: song.language,
            duration: song.duration,
            release_date: song.release_date,
            popularity_score: song.popularity_score,
            spotify_id: song.spotify_id,
            youtube_id: song.youtube_id,
        }
    }
}

/// The system's answer to "what song is this clip?"
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionResult {
    pub song: SongInfo,
    /// Similarity score of the winning candidate, in [0, 1]
    pub confidence: f32,
    pub match_type: &'static str,
    pub processing_time_ms: u64,
}

/// Song metadata supplied by ingestion callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongMetadata {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Full song duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Release date, YYYY-MM-DD
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub popularity_score: f64,
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub youtube_id: Option<String>,
}

/// Aggregate recognition statistics from the catalogue
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecognitionStats {
    pub total_recognitions: u64,
    pub matched: u64,
    pub failed: u64,
    /// matched / total, 0.0 when the log is empty
    pub match_rate: f64,
    pub avg_processing_time_ms: f64,
}
