//! Song ingestion endpoints
//!
//! - POST /api/v1/songs - ingest one song
//! - POST /api/v1/songs/batch - bulk import
//! - GET /api/v1/songs/:id - look up a catalogued song
//! - DELETE /api/v1/songs/:id - remove a song from catalogue and index

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::Principal;
use crate::error::{ApiError, ApiResult};
use crate::models::{SongInfo, SongMetadata};
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AddSongRequest {
    #[serde(flatten)]
    metadata: SongMetadata,
    /// Base64-encoded audio bytes used for fingerprinting
    audio_data: String,
}

#[derive(Debug, Deserialize)]
struct BatchAddSongsRequest {
    songs: Vec<AddSongRequest>,
}

#[derive(Debug, Serialize)]
struct SongCreatedResponse {
    success: bool,
    data: SongCreatedData,
}

#[derive(Debug, Serialize)]
struct SongCreatedData {
    song_id: Uuid,
}

#[derive(Debug, Serialize)]
struct BatchCreatedResponse {
    success: bool,
    data: BatchCreatedData,
}

#[derive(Debug, Serialize)]
struct BatchCreatedData {
    song_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct SongResponse {
    success: bool,
    data: SongInfo,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    success: bool,
    message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/songs
async fn add_song(
    State(state): State<AppState>,
    _principal: Principal,
    Json(request): Json<AddSongRequest>,
) -> ApiResult<(StatusCode, Json<SongCreatedResponse>)> {
    let audio_data = decode_audio(&request.audio_data)?;
    let song_id = state.ingestor.add_song(&request.metadata, &audio_data).await?;

    Ok((
        StatusCode::CREATED,
        Json(SongCreatedResponse {
            success: true,
            data: SongCreatedData { song_id },
        }),
    ))
}

/// POST /api/v1/songs/batch
///
/// All payloads are decoded before any write, so a malformed entry fails
/// the batch without touching either store.
async fn batch_add_songs(
    State(state): State<AppState>,
    _principal: Principal,
    Json(request): Json<BatchAddSongsRequest>,
) -> ApiResult<(StatusCode, Json<BatchCreatedResponse>)> {
    let mut songs = Vec::with_capacity(request.songs.len());
    for song in request.songs {
        let audio_data = decode_audio(&song.audio_data)?;
        songs.push((song.metadata, audio_data));
    }

    let song_ids = state.ingestor.batch_add_songs(&songs).await?;

    Ok((
        StatusCode::CREATED,
        Json(BatchCreatedResponse {
            success: true,
            data: BatchCreatedData { song_ids },
        }),
    ))
}

/// GET /api/v1/songs/:song_id
async fn get_song(
    State(state): State<AppState>,
    Path(song_id): Path<Uuid>,
) -> ApiResult<Json<SongResponse>> {
    let song = state
        .catalogue
        .get_song(song_id)
        .await?
        .ok_or(ApiError::SongNotFound(song_id))?;

    Ok(Json(SongResponse {
        success: true,
        data: song.into(),
    }))
}

/// DELETE /api/v1/songs/:song_id
async fn delete_song(
    State(state): State<AppState>,
    _principal: Principal,
    Path(song_id): Path<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    if !state.ingestor.delete_song(song_id).await? {
        return Err(ApiError::SongNotFound(song_id));
    }

    Ok(Json(DeletedResponse {
        success: true,
        message: "Song deleted successfully",
    }))
}

fn decode_audio(encoded: &str) -> ApiResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ApiError::BadRequest(format!("audio_data is not valid base64: {}", e)))
}

/// Build song ingestion routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/songs", post(add_song))
        .route("/api/v1/songs/batch", post(batch_add_songs))
        .route("/api/v1/songs/:song_id", get(get_song).delete(delete_song))
}
