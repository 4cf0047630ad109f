//! Core domain types for the recognition pipeline

use serde::{Deserialize, Serialize};

/// A single spectral landmark produced by the audio engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Peak frequency in Hz (bounded by Nyquist, <= 20 kHz in practice)
    pub frequency: f32,
    /// Peak position in seconds from clip start
    pub time: f32,
    /// Peak magnitude (non-negative)
    pub magnitude: f32,
}

/// Fingerprint metadata reported by the audio engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerprintMetadata {
    /// Clip duration in seconds; strictly positive when present
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Order-free collection of spectral peaks summarising an audio clip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub peaks: Vec<Peak>,
    #[serde(default)]
    pub metadata: FingerprintMetadata,
}

impl Fingerprint {
    /// Clip duration in seconds; missing or non-positive values fall back
    /// to 1.0 so time-histogram binning stays well defined.
    pub fn duration_or_default(&self) -> f64 {
        self.metadata.duration.filter(|d| *d > 0.0).unwrap_or(1.0)
    }
}

/// Decoder-reported properties of an uploaded clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Clip duration in seconds
    pub duration_seconds: f64,
    /// Decoder quality assessment, e.g. "high", "medium", "low"
    pub quality: String,
}
