//! Ingestion orchestrator
//!
//! Dual-writes each new song: catalogue row first (the catalogue is the
//! source of truth), then the fingerprint embedding into the vector index.
//! On vector failure the catalogue row is retained; an unrecognisable but
//! discoverable song beats a dangling index entry, and a reconciler can
//! retry the upsert later.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::SongMetadata;
use crate::services::audio::{AudioAnalyzer, AudioAnalyzerError};
use crate::services::catalogue::SongCatalogue;
use crate::services::projector;
use crate::services::vector_index::{
    fingerprint_entry_id, VectorBackendError, VectorEntry, VectorIndex,
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Audio(#[from] AudioAnalyzerError),

    #[error(transparent)]
    VectorBackend(#[from] VectorBackendError),

    #[error("Catalogue error: {0}")]
    Catalogue(#[from] cadenza_common::Error),
}

pub struct Ingestor {
    audio: Arc<dyn AudioAnalyzer>,
    catalogue: Arc<dyn SongCatalogue>,
    index: Arc<dyn VectorIndex>,
    dimensions: usize,
}

impl Ingestor {
    pub fn new(
        audio: Arc<dyn AudioAnalyzer>,
        catalogue: Arc<dyn SongCatalogue>,
        index: Arc<dyn VectorIndex>,
        dimensions: usize,
    ) -> Self {
        Self {
            audio,
            catalogue,
            index,
            dimensions,
        }
    }

    /// Add one song to the catalogue and the vector index
    pub async fn add_song(
        &self,
        metadata: &SongMetadata,
        audio_data: &[u8],
    ) -> Result<Uuid, IngestError> {
        let fingerprint = self.audio.generate_fingerprint(audio_data).await?;
        let song_id = self.catalogue.create_song(metadata).await?;

        let values = projector::project(&fingerprint, self.dimensions);
        let entry = VectorEntry::for_song(song_id, values, index_metadata(metadata));
        self.index.upsert(vec![entry], None).await?;

        info!(%song_id, title = %metadata.title, "Song ingested");
        Ok(song_id)
    }

    /// Bulk import. Catalogue rows are created sequentially to obtain ids,
    /// then all embeddings go up in one chunked upsert. If the upsert fails
    /// every created row remains and the backend error surfaces; the rows
    /// are reconciled out of band.
    pub async fn batch_add_songs(
        &self,
        songs: &[(SongMetadata, Vec<u8>)],
    ) -> Result<Vec<Uuid>, IngestError> {
        let mut song_ids = Vec::with_capacity(songs.len());
        let mut entries = Vec::with_capacity(songs.len());

        for (metadata, audio_data) in songs {
            let fingerprint = self.audio.generate_fingerprint(audio_data).await?;
            let song_id = self.catalogue.create_song(metadata).await?;

            let values = projector::project(&fingerprint, self.dimensions);
            entries.push(VectorEntry::for_song(song_id, values, index_metadata(metadata)));
            song_ids.push(song_id);
        }

        if !entries.is_empty() {
            self.index.upsert(entries, None).await?;
        }

        info!(count = song_ids.len(), "Batch ingest complete");
        Ok(song_ids)
    }

    /// Remove a song from both stores. The vector entry goes first: if the
    /// second delete then fails, the leftover catalogue row is the benign
    /// dangling direction.
    pub async fn delete_song(&self, song_id: Uuid) -> Result<bool, IngestError> {
        if self.catalogue.get_song(song_id).await?.is_none() {
            return Ok(false);
        }

        self.index
            .delete(&[fingerprint_entry_id(song_id)], None)
            .await?;

        if !self.catalogue.delete_song(song_id).await? {
            // Lost a race with another deleter after the vector delete
            warn!(%song_id, "Song row vanished during delete");
        }
        Ok(true)
    }
}

/// Caller-facing metadata carried on the vector entry, used by filtered
/// queries and for display without a catalogue round-trip
fn index_metadata(metadata: &SongMetadata) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("title".to_string(), json!(metadata.title));
    map.insert("artist".to_string(), json!(metadata.artist));
    map.insert(
        "language".to_string(),
        json!(metadata.language.as_deref().unwrap_or("en")),
    );
    map.insert(
        "genre".to_string(),
        json!(metadata.genre.as_deref().unwrap_or("")),
    );
    map.insert(
        "album".to_string(),
        json!(metadata.album.as_deref().unwrap_or("")),
    );
    map.insert(
        "popularity_score".to_string(),
        json!(metadata.popularity_score),
    );
    map
}
