//! Recognition endpoints
//!
//! - POST /api/v1/recognition - recognize an uploaded clip (multipart)
//! - POST /api/v1/recognition/stream - recognize streamed audio (base64 body)
//! - GET /api/v1/recognition/history - the caller's recognition history
//! - DELETE /api/v1/recognition/history/:id - delete one history entry
//! - GET /api/v1/recognition/stats - catalogue + index statistics

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use cadenza_common::Stopwatch;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::api::{Principal, API_VERSION};
use crate::db::recognition_log::RecognitionLogEntry;
use crate::error::{ApiError, ApiResult};
use crate::models::{RecognitionResult, RecognitionStats};
use crate::services::vector_index::IndexStats;
use crate::AppState;

const HISTORY_DEFAULT_LIMIT: u32 = 50;
const HISTORY_MAX_LIMIT: u32 = 200;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct RecognitionResponse {
    success: bool,
    data: RecognitionResult,
    metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
struct ResponseMetadata {
    request_id: Uuid,
    processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    streaming: Option<bool>,
    api_version: &'static str,
}

#[derive(Debug, Deserialize)]
struct StreamRecognitionRequest {
    /// Base64-encoded audio bytes
    audio_data: String,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_history_limit() -> u32 {
    HISTORY_DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    success: bool,
    data: HistoryData,
}

#[derive(Debug, Serialize)]
struct HistoryData {
    recognitions: Vec<RecognitionLogEntry>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
struct Pagination {
    limit: u32,
    offset: u32,
    has_more: bool,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    success: bool,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    success: bool,
    data: StatsData,
}

#[derive(Debug, Serialize)]
struct StatsData {
    recognition: RecognitionStats,
    vector_index: IndexStats,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/recognition
///
/// Multipart upload: `audio_file` (required, content type must be audio/*),
/// optional `format`, `duration`, `language`.
async fn recognize(
    State(state): State<AppState>,
    principal: Principal,
    mut multipart: Multipart,
) -> ApiResult<Json<RecognitionResponse>> {
    check_rate_limit(&state)?;

    let request_id = Uuid::new_v4();
    let clock = Stopwatch::start();
    let limits = state.settings.audio_limits;

    let mut audio_data: Option<Vec<u8>> = None;
    let mut language: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio_file") => {
                let content_type = field.content_type().unwrap_or("unknown").to_string();
                if !content_type.starts_with("audio/") {
                    return Err(ApiError::InvalidAudioFormat(format!(
                        "Unsupported content type: {}",
                        content_type
                    )));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read audio_file: {}", e)))?;
                if bytes.len() > limits.max_size_bytes {
                    return Err(ApiError::PayloadTooLarge {
                        size: bytes.len(),
                        limit: limits.max_size_bytes,
                    });
                }
                audio_data = Some(bytes.to_vec());
            }
            Some("language") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read language: {}", e)))?;
                language = normalize_language(&value);
            }
            // Accepted for compatibility; the decoder's probe is authoritative
            Some("format") | Some("duration") => {
                let _ = field.text().await;
            }
            _ => {}
        }
    }

    let audio_data =
        audio_data.ok_or_else(|| ApiError::BadRequest("Missing audio_file field".to_string()))?;

    let info = state.audio.probe(&audio_data).await.map_err(ApiError::from)?;
    if info.duration_seconds < limits.min_duration_seconds {
        return Err(ApiError::AudioTooShort {
            duration: info.duration_seconds,
            minimum: limits.min_duration_seconds,
        });
    }
    if info.duration_seconds > limits.max_duration_seconds {
        return Err(ApiError::AudioTooLong {
            duration: info.duration_seconds,
            maximum: limits.max_duration_seconds,
        });
    }

    let result = state
        .recognizer
        .recognize(&audio_data, language.as_deref(), request_id, Some(principal.user_id))
        .await?;

    let Some(result) = result else {
        log_no_match(&state, request_id, principal.user_id, &clock).await;
        return Err(ApiError::RecognitionFailed(
            "No matching song found".to_string(),
        ));
    };

    Ok(Json(RecognitionResponse {
        success: true,
        data: result,
        metadata: ResponseMetadata {
            request_id,
            processing_time_ms: clock.elapsed_ms(),
            audio_duration: Some(info.duration_seconds),
            audio_quality: Some(info.quality),
            streaming: None,
            api_version: API_VERSION,
        },
    }))
}

/// POST /api/v1/recognition/stream
///
/// Real-time path: recognition runs on the first chunk of the submitted
/// audio so the answer returns as soon as enough signal exists.
async fn recognize_stream(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<StreamRecognitionRequest>,
) -> ApiResult<Json<RecognitionResponse>> {
    check_rate_limit(&state)?;

    let request_id = Uuid::new_v4();
    let clock = Stopwatch::start();

    let audio_data = general_purpose::STANDARD
        .decode(&request.audio_data)
        .map_err(|e| ApiError::BadRequest(format!("audio_data is not valid base64: {}", e)))?;
    if audio_data.len() > state.settings.audio_limits.max_size_bytes {
        return Err(ApiError::PayloadTooLarge {
            size: audio_data.len(),
            limit: state.settings.audio_limits.max_size_bytes,
        });
    }

    let language = request.language.as_deref().and_then(|l| normalize_language(l));
    let result = state
        .recognizer
        .recognize_streaming(&audio_data, language.as_deref(), request_id, Some(principal.user_id))
        .await?;

    let Some(result) = result else {
        log_no_match(&state, request_id, principal.user_id, &clock).await;
        return Err(ApiError::RecognitionFailed(
            "No matching song found".to_string(),
        ));
    };

    Ok(Json(RecognitionResponse {
        success: true,
        data: result,
        metadata: ResponseMetadata {
            request_id,
            processing_time_ms: clock.elapsed_ms(),
            audio_duration: None,
            audio_quality: None,
            streaming: Some(true),
            api_version: API_VERSION,
        },
    }))
}

/// GET /api/v1/recognition/history
async fn history(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let limit = query.limit.clamp(1, HISTORY_MAX_LIMIT);

    let recognitions = state
        .catalogue
        .get_recognition_history(principal.user_id, limit, query.offset)
        .await?;

    let has_more = recognitions.len() as u32 == limit;
    Ok(Json(HistoryResponse {
        success: true,
        data: HistoryData {
            recognitions,
            pagination: Pagination {
                limit,
                offset: query.offset,
                has_more,
            },
        },
    }))
}

/// DELETE /api/v1/recognition/history/:recognition_id
async fn delete_history(
    State(state): State<AppState>,
    principal: Principal,
    Path(recognition_id): Path<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = state
        .catalogue
        .delete_recognition_history(recognition_id, principal.user_id)
        .await?;

    if !deleted {
        return Err(ApiError::NotFound(format!(
            "Recognition not found: {}",
            recognition_id
        )));
    }

    Ok(Json(DeletedResponse {
        success: true,
        message: "Recognition deleted successfully",
    }))
}

/// GET /api/v1/recognition/stats
async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let recognition = state.catalogue.get_recognition_stats().await?;
    let vector_index = state.index.stats().await?;

    Ok(Json(StatsResponse {
        success: true,
        data: StatsData {
            recognition,
            vector_index,
        },
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn check_rate_limit(state: &AppState) -> ApiResult<()> {
    state
        .rate_limiter
        .check()
        .map_err(|_| ApiError::RateLimitExceeded)
}

/// "auto" and empty values mean no language filter
fn normalize_language(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A below-threshold outcome still produces a log entry; failures to write
/// it never mask the response.
async fn log_no_match(state: &AppState, request_id: Uuid, user_id: Uuid, clock: &Stopwatch) {
    if let Err(e) = state
        .catalogue
        .log_recognition_error(
            request_id,
            Some(user_id),
            "No matching song found",
            clock.elapsed_ms(),
        )
        .await
    {
        warn!(%request_id, "Failed to write error log entry: {}", e);
    }
}

/// Build recognition routes
pub fn recognition_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/recognition", post(recognize))
        .route("/api/v1/recognition/stream", post(recognize_stream))
        .route("/api/v1/recognition/history", get(history))
        .route(
            "/api/v1/recognition/history/:recognition_id",
            delete(delete_history),
        )
        .route("/api/v1/recognition/stats", get(stats))
}
