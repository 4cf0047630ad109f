//! Recognition orchestrator
//!
//! Owns the per-request lifecycle: fingerprint the clip, project it into
//! the embedding space, query the vector index, scan candidates against the
//! confidence threshold, resolve the winner through the catalogue, and log
//! the outcome. Per-candidate defects (unparseable song id, dangling index
//! entry) are skipped; backend and catalogue failures surface to the caller.

use std::sync::Arc;

use cadenza_common::Stopwatch;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{RecognitionResult, MATCH_TYPE_VECTOR_SIMILARITY};
use crate::services::audio::{AudioAnalyzer, AudioAnalyzerError};
use crate::services::catalogue::SongCatalogue;
use crate::services::projector;
use crate::services::vector_index::{MetadataFilter, VectorBackendError, VectorIndex};

/// Streaming recognition works on the first chunk of this size; later
/// chunks are the responsibility of a higher layer that may re-issue the
/// call.
const STREAM_CHUNK_BYTES: usize = 1024 * 1024;

/// Recognition pipeline settings
#[derive(Debug, Clone, Copy)]
pub struct RecognizerConfig {
    /// Exclusive confidence floor; a score at or below it never matches
    pub threshold: f32,
    /// Candidates requested from the vector index per query
    pub max_candidates: usize,
    /// Embedding dimension shared with the index
    pub dimensions: usize,
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error(transparent)]
    Audio(#[from] AudioAnalyzerError),

    #[error(transparent)]
    VectorBackend(#[from] VectorBackendError),

    #[error("Catalogue error: {0}")]
    Catalogue(#[from] cadenza_common::Error),
}

pub struct Recognizer {
    audio: Arc<dyn AudioAnalyzer>,
    catalogue: Arc<dyn SongCatalogue>,
    index: Arc<dyn VectorIndex>,
    config: RecognizerConfig,
}

impl Recognizer {
    pub fn new(
        audio: Arc<dyn AudioAnalyzer>,
        catalogue: Arc<dyn SongCatalogue>,
        index: Arc<dyn VectorIndex>,
        config: RecognizerConfig,
    ) -> Self {
        Self {
            audio,
            catalogue,
            index,
            config,
        }
    }

    /// Recognize a clip. `Ok(None)` means no candidate crossed the
    /// threshold: a normal outcome, not an error.
    ///
    /// The outcome is logged through the catalogue; log-write failures are
    /// swallowed so they never mask the primary result.
    pub async fn recognize(
        &self,
        audio_data: &[u8],
        language: Option<&str>,
        request_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Option<RecognitionResult>, RecognitionError> {
        let clock = Stopwatch::start();

        match self.recognize_inner(audio_data, language, request_id, clock).await {
            Ok(Some(result)) => {
                info!(
                    %request_id,
                    song_id = %result.song.id,
                    confidence = result.confidence,
                    "Recognition successful"
                );
                if let Err(e) = self
                    .catalogue
                    .log_recognition(
                        request_id,
                        user_id,
                        result.song.id,
                        result.confidence,
                        result.processing_time_ms,
                    )
                    .await
                {
                    warn!(%request_id, "Failed to write recognition log entry: {}", e);
                }
                Ok(Some(result))
            }
            Ok(None) => {
                info!(%request_id, "No match above threshold");
                Ok(None)
            }
            Err(e) => {
                if let Err(log_err) = self
                    .catalogue
                    .log_recognition_error(request_id, user_id, &e.to_string(), clock.elapsed_ms())
                    .await
                {
                    warn!(%request_id, "Failed to write error log entry: {}", log_err);
                }
                Err(e)
            }
        }
    }

    /// Streaming variant: recognize from the first 1 MiB so the answer
    /// returns as soon as enough signal exists.
    pub async fn recognize_streaming(
        &self,
        audio_data: &[u8],
        language: Option<&str>,
        request_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Option<RecognitionResult>, RecognitionError> {
        let first_chunk = &audio_data[..audio_data.len().min(STREAM_CHUNK_BYTES)];
        if first_chunk.is_empty() {
            return Ok(None);
        }
        self.recognize(first_chunk, language, request_id, user_id).await
    }

    async fn recognize_inner(
        &self,
        audio_data: &[u8],
        language: Option<&str>,
        request_id: Uuid,
        clock: Stopwatch,
    ) -> Result<Option<RecognitionResult>, RecognitionError> {
        let fingerprint = self.audio.generate_fingerprint(audio_data).await?;
        debug!(%request_id, peaks = fingerprint.peaks.len(), "Fingerprint extracted");

        let query_vector = projector::project(&fingerprint, self.config.dimensions);

        let filter = language.map(MetadataFilter::language);
        let candidates = self
            .index
            .query(&query_vector, self.config.max_candidates, filter.as_ref(), None)
            .await?;

        if candidates.is_empty() {
            debug!(%request_id, "Vector index returned no candidates");
            return Ok(None);
        }

        let mut best: Option<RecognitionResult> = None;
        let mut best_score = 0.0f32;

        for candidate in &candidates {
            if candidate.score <= self.config.threshold {
                continue;
            }
            if candidate.score <= best_score {
                continue;
            }

            let Some(song_id_str) = candidate.song_id() else {
                warn!(%request_id, entry_id = %candidate.id, "Vector match has no song_id metadata, skipping");
                continue;
            };
            let song_id = match Uuid::parse_str(song_id_str) {
                Ok(id) => id,
                Err(e) => {
                    warn!(
                        %request_id,
                        song_id = song_id_str,
                        "Invalid song id in vector match metadata ({}), skipping",
                        e
                    );
                    continue;
                }
            };

            let Some(song) = self.catalogue.get_song(song_id).await? else {
                warn!(%request_id, %song_id, "Vector match references a song missing from the catalogue, skipping");
                continue;
            };

            best_score = candidate.score;
            best = Some(RecognitionResult {
                song: song.into(),
                confidence: candidate.score,
                match_type: MATCH_TYPE_VECTOR_SIMILARITY,
                processing_time_ms: clock.elapsed_ms(),
            });
        }

        Ok(best)
    }
}
