//! # Cadenza Common Library
//!
//! Shared code for Cadenza services:
//! - Error types
//! - Configuration loading (ENV -> TOML -> default)
//! - Database pool initialization
//! - Timing utilities

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
pub use time::Stopwatch;
