//! cadenza-mr - Music Recognition service
//!
//! Resolves short audio clips to catalogued songs: the upstream audio
//! engine extracts a spectral-peak fingerprint, the projector turns it into
//! a fixed-dimensional embedding, and an approximate nearest-neighbour
//! query against the hosted vector index produces scored candidates. The
//! catalogue (SQLite) is the source of truth for song metadata and the
//! append-only recognition log.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::config::{RateLimitSettings, Settings};
use crate::services::{
    AudioAnalyzer, Ingestor, Recognizer, RecognizerConfig, SongCatalogue, VectorIndex,
};

/// Slack on top of the audio byte ceiling for multipart framing overhead
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub audio: Arc<dyn AudioAnalyzer>,
    pub catalogue: Arc<dyn SongCatalogue>,
    pub index: Arc<dyn VectorIndex>,
    pub recognizer: Arc<Recognizer>,
    pub ingestor: Arc<Ingestor>,
    pub rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        audio: Arc<dyn AudioAnalyzer>,
        catalogue: Arc<dyn SongCatalogue>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let recognizer = Arc::new(Recognizer::new(
            audio.clone(),
            catalogue.clone(),
            index.clone(),
            RecognizerConfig {
                threshold: settings.recognition.threshold,
                max_candidates: settings.recognition.max_candidates,
                dimensions: settings.vector_db.dimensions,
            },
        ));
        let ingestor = Arc::new(Ingestor::new(
            audio.clone(),
            catalogue.clone(),
            index.clone(),
            settings.vector_db.dimensions,
        ));
        let rate_limiter = Arc::new(build_rate_limiter(&settings.rate_limit));

        Self {
            settings,
            audio,
            catalogue,
            index,
            recognizer,
            ingestor,
            rate_limiter,
        }
    }
}

fn build_rate_limiter(settings: &RateLimitSettings) -> DefaultDirectRateLimiter {
    let requests = NonZeroU32::new(settings.requests).unwrap_or(NonZeroU32::MIN);
    let replenish = Duration::from_secs(settings.window_seconds.max(1)) / requests.get();
    let quota = Quota::with_period(replenish)
        .unwrap_or_else(|| Quota::per_second(requests))
        .allow_burst(requests);
    RateLimiter::direct(quota)
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.settings.audio_limits.max_size_bytes + BODY_LIMIT_SLACK;

    Router::new()
        .merge(api::health_routes())
        .merge(api::recognition_routes())
        .merge(api::song_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
