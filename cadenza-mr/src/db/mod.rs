//! Database access for cadenza-mr
//!
//! Plain async functions over a shared `SqlitePool`; the `SongCatalogue`
//! trait in `services::catalogue` wraps these for the orchestrators.

pub mod recognition_log;
pub mod schema;
pub mod songs;
