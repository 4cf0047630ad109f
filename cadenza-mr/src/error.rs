//! Error types for cadenza-mr
//!
//! One `ApiError` per failure kind the HTTP surface can produce; service
//! layer errors convert in via `From` so handlers stay on `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::audio::AudioAnalyzerError;
use crate::services::ingest::IngestError;
use crate::services::recognizer::RecognitionError;
use crate::services::vector_index::VectorBackendError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Decoder rejected the clip or the content type is not audio (400)
    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    /// Clip shorter than the configured minimum (400)
    #[error("Audio duration too short: {duration}s (minimum: {minimum}s)")]
    AudioTooShort { duration: f64, minimum: f64 },

    /// Clip longer than the configured maximum (400)
    #[error("Audio duration too long: {duration}s (maximum: {maximum}s)")]
    AudioTooLong { duration: f64, maximum: f64 },

    /// Upload exceeds the configured byte ceiling (413)
    #[error("Audio file too large: {size} bytes (maximum: {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Decoder ran but produced no usable fingerprint (422)
    #[error("Audio processing failed: {0}")]
    AudioProcessing(String),

    /// Pipeline ran but no candidate crossed the threshold (422)
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    /// Explicit lookup of an unknown song (404)
    #[error("Song not found: {0}")]
    SongNotFound(Uuid),

    /// Generic missing resource (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Principal missing or unparseable (401)
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Principal authenticated but not the owner of the resource (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Too many requests in the current window (429)
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Any failure of the vector backend (500)
    #[error(transparent)]
    VectorBackend(#[from] VectorBackendError),

    /// Any failure of the catalogue (500)
    #[error("Catalogue error: {0}")]
    Catalogue(#[from] cadenza_common::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<AudioAnalyzerError> for ApiError {
    fn from(err: AudioAnalyzerError) -> Self {
        match err {
            AudioAnalyzerError::Rejected(msg) => ApiError::InvalidAudioFormat(msg),
            AudioAnalyzerError::Processing(msg) => ApiError::AudioProcessing(msg),
            AudioAnalyzerError::Unavailable(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<RecognitionError> for ApiError {
    fn from(err: RecognitionError) -> Self {
        match err {
            RecognitionError::Audio(e) => e.into(),
            RecognitionError::VectorBackend(e) => ApiError::VectorBackend(e),
            RecognitionError::Catalogue(e) => ApiError::Catalogue(e),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Audio(e) => e.into(),
            IngestError::VectorBackend(e) => ApiError::VectorBackend(e),
            IngestError::Catalogue(e) => ApiError::Catalogue(e),
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidAudioFormat(_) => (StatusCode::BAD_REQUEST, "INVALID_AUDIO_FORMAT"),
            ApiError::AudioTooShort { .. } => (StatusCode::BAD_REQUEST, "AUDIO_TOO_SHORT"),
            ApiError::AudioTooLong { .. } => (StatusCode::BAD_REQUEST, "AUDIO_TOO_LONG"),
            ApiError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "AUDIO_TOO_LARGE")
            }
            ApiError::AudioProcessing(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "AUDIO_PROCESSING_ERROR")
            }
            ApiError::RecognitionFailed(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "RECOGNITION_FAILED")
            }
            ApiError::SongNotFound(_) => (StatusCode::NOT_FOUND, "SONG_NOT_FOUND"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "AUTHORIZATION_FAILED"),
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            ApiError::VectorBackend(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "VECTOR_BACKEND_ERROR")
            }
            ApiError::Catalogue(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CATALOGUE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
