//! Audio engine client
//!
//! The decoder and spectral feature extractor live in a separate audio
//! engine; this service only speaks to it over HTTP. The `AudioAnalyzer`
//! trait is the seam the orchestrators depend on.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::AudioEngineSettings;
use crate::types::{AudioInfo, Fingerprint};

/// Audio engine failures, split by who is at fault
#[derive(Debug, Error)]
pub enum AudioAnalyzerError {
    /// The engine rejected the clip outright (unsupported or corrupt input)
    #[error("Invalid audio: {0}")]
    Rejected(String),

    /// The engine decoded the clip but produced no usable fingerprint
    #[error("Audio processing failed: {0}")]
    Processing(String),

    /// The engine could not be reached or failed internally
    #[error("Audio engine unavailable: {0}")]
    Unavailable(String),
}

/// Contract the upstream audio engine must satisfy
#[async_trait]
pub trait AudioAnalyzer: Send + Sync {
    /// Decode a clip and extract its spectral-peak fingerprint
    async fn generate_fingerprint(&self, audio: &[u8]) -> Result<Fingerprint, AudioAnalyzerError>;

    /// Decode only far enough to report duration and quality
    async fn probe(&self, audio: &[u8]) -> Result<AudioInfo, AudioAnalyzerError>;

    async fn health(&self) -> bool;
}

/// HTTP client for the audio engine
pub struct HttpAudioAnalyzer {
    http_client: Client,
    base_url: String,
}

impl HttpAudioAnalyzer {
    pub fn new(settings: &AudioEngineSettings) -> Result<Self, AudioAnalyzerError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| AudioAnalyzerError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_audio<R>(&self, path: &str, audio: &[u8]) -> Result<R, AudioAnalyzerError>
    where
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(bytes = audio.len(), %url, "Submitting audio to engine");

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| AudioAnalyzerError::Unavailable(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST => AudioAnalyzerError::Rejected(body),
                StatusCode::UNPROCESSABLE_ENTITY => AudioAnalyzerError::Processing(body),
                _ => AudioAnalyzerError::Unavailable(format!("Engine returned {}: {}", status, body)),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| AudioAnalyzerError::Unavailable(format!("Malformed engine response: {}", e)))
    }
}

#[async_trait]
impl AudioAnalyzer for HttpAudioAnalyzer {
    async fn generate_fingerprint(&self, audio: &[u8]) -> Result<Fingerprint, AudioAnalyzerError> {
        self.post_audio("/v1/fingerprint", audio).await
    }

    async fn probe(&self, audio: &[u8]) -> Result<AudioInfo, AudioAnalyzerError> {
        self.post_audio("/v1/probe", audio).await
    }

    async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
