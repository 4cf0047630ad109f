//! HTTP API for cadenza-mr

mod health;
mod principal;
mod recognition;
mod songs;

pub use health::health_routes;
pub use principal::Principal;
pub use recognition::recognition_routes;
pub use songs::song_routes;

/// API version reported in response envelopes
pub const API_VERSION: &str = "1.0";
