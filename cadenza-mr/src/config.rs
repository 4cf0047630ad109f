//! Configuration resolution for cadenza-mr
//!
//! Every setting resolves with the same priority: command-line argument,
//! then environment variable, then TOML config file, then compiled default.
//! The vector backend API key is the only setting without a default; a
//! missing key is a startup error with remediation steps.

use cadenza_common::config::{env_parse, env_string, load_toml_config};
use cadenza_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub audio_engine: AudioEngineSettings,
    pub vector_db: VectorDbSettings,
    pub recognition: RecognitionSettings,
    pub audio_limits: AudioLimits,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct AudioEngineSettings {
    pub url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct VectorDbSettings {
    pub api_key: String,
    pub environment: String,
    pub index_name: String,
    pub dimensions: usize,
}

impl VectorDbSettings {
    /// Host derived from index name and environment
    pub fn base_url(&self) -> String {
        format!("https://{}-{}.svc.pinecone.io", self.index_name, self.environment)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecognitionSettings {
    pub threshold: f32,
    pub max_candidates: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AudioLimits {
    pub min_duration_seconds: f64,
    pub max_duration_seconds: f64,
    pub max_size_bytes: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub requests: u32,
    pub window_seconds: u64,
}

/// TOML config file shape; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub audio_engine: TomlAudioEngine,
    #[serde(default)]
    pub vector_db: TomlVectorDb,
    #[serde(default)]
    pub recognition: TomlRecognition,
    #[serde(default)]
    pub audio: TomlAudioLimits,
    #[serde(default)]
    pub rate_limit: TomlRateLimit,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlAudioEngine {
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlVectorDb {
    pub api_key: Option<String>,
    pub environment: Option<String>,
    pub index_name: Option<String>,
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlRecognition {
    pub threshold: Option<f32>,
    pub max_candidates: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlAudioLimits {
    pub min_duration_seconds: Option<f64>,
    pub max_duration_seconds: Option<f64>,
    pub max_size_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlRateLimit {
    pub requests: Option<u32>,
    pub window_seconds: Option<u64>,
}

/// Command-line overrides, parsed by clap in the binary
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub port: Option<u16>,
}

impl Settings {
    /// Resolve all settings from CLI, environment, and TOML
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .or_else(|| cadenza_common::config::default_config_path("cadenza-mr"));
        let toml: TomlConfig = load_toml_config(config_path.as_deref())?;

        Self::from_layers(cli, &toml)
    }

    /// Layered resolution, separated from path handling for tests
    pub fn from_layers(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let api_key = env_string("VECTOR_DB_API_KEY")
            .or_else(|| toml.vector_db.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Vector backend API key not configured. Set one of:\n\
                     1. Environment: VECTOR_DB_API_KEY=your-key-here\n\
                     2. TOML config: [vector_db] api_key = \"your-key\""
                        .to_string(),
                )
            })?;

        Ok(Self {
            host: env_string("CADENZA_HOST")
                .or_else(|| toml.host.clone())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: cli
                .port
                .or(env_parse("CADENZA_PORT")?)
                .or(toml.port)
                .unwrap_or(5740),
            database_path: cli
                .database
                .clone()
                .or_else(|| env_string("CADENZA_DATABASE").map(PathBuf::from))
                .or_else(|| toml.database_path.clone())
                .unwrap_or_else(|| PathBuf::from("cadenza.db")),
            audio_engine: AudioEngineSettings {
                url: env_string("AUDIO_ENGINE_URL")
                    .or_else(|| toml.audio_engine.url.clone())
                    .unwrap_or_else(|| "http://localhost:8080".to_string()),
                timeout_seconds: env_parse("AUDIO_ENGINE_TIMEOUT")?
                    .or(toml.audio_engine.timeout_seconds)
                    .unwrap_or(30),
            },
            vector_db: VectorDbSettings {
                api_key,
                environment: env_string("VECTOR_DB_ENVIRONMENT")
                    .or_else(|| toml.vector_db.environment.clone())
                    .unwrap_or_else(|| "us-west1-gcp".to_string()),
                index_name: env_string("VECTOR_DB_INDEX_NAME")
                    .or_else(|| toml.vector_db.index_name.clone())
                    .unwrap_or_else(|| "cadenza-music".to_string()),
                dimensions: env_parse("VECTOR_DB_DIMENSIONS")?
                    .or(toml.vector_db.dimensions)
                    .unwrap_or(1024),
            },
            recognition: RecognitionSettings {
                threshold: env_parse("RECOGNITION_THRESHOLD")?
                    .or(toml.recognition.threshold)
                    .unwrap_or(0.8),
                max_candidates: env_parse("RECOGNITION_MAX_CANDIDATES")?
                    .or(toml.recognition.max_candidates)
                    .unwrap_or(10),
            },
            audio_limits: AudioLimits {
                min_duration_seconds: env_parse("MIN_AUDIO_DURATION")?
                    .or(toml.audio.min_duration_seconds)
                    .unwrap_or(3.0),
                max_duration_seconds: env_parse("MAX_AUDIO_DURATION")?
                    .or(toml.audio.max_duration_seconds)
                    .unwrap_or(30.0),
                max_size_bytes: env_parse("MAX_AUDIO_SIZE")?
                    .or(toml.audio.max_size_bytes)
                    .unwrap_or(10 * 1024 * 1024),
            },
            rate_limit: RateLimitSettings {
                requests: env_parse("RATE_LIMIT_REQUESTS")?
                    .or(toml.rate_limit.requests)
                    .unwrap_or(100)
                    .max(1),
                window_seconds: env_parse("RATE_LIMIT_WINDOW")?
                    .or(toml.rate_limit.window_seconds)
                    .unwrap_or(60)
                    .max(1),
            },
        })
    }
}
