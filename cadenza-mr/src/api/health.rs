//! Service identity and health endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
struct RootResponse {
    service: &'static str,
    version: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub components: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub audio_engine: bool,
    pub catalogue: bool,
    pub vector_index: bool,
}

/// GET /
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: "cadenza-mr",
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

/// GET /health
///
/// Reports per-component health; the service stays up (200) even when a
/// collaborator is down so monitors can see which one.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (audio_engine, catalogue, vector_index) = tokio::join!(
        state.audio.health(),
        state.catalogue.health(),
        state.index.health(),
    );

    let all_healthy = audio_engine && catalogue && vector_index;
    Json(HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" },
        module: "cadenza-mr",
        version: env!("CARGO_PKG_VERSION"),
        components: ComponentHealth {
            audio_engine,
            catalogue,
            vector_index,
        },
    })
}

/// Build health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
