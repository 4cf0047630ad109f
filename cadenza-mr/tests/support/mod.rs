//! Shared test doubles and builders for integration tests
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map};
use sqlx::SqlitePool;
use uuid::Uuid;

use cadenza_mr::config::{
    AudioEngineSettings, AudioLimits, RateLimitSettings, RecognitionSettings, Settings,
    VectorDbSettings,
};
use cadenza_mr::db::schema::initialize_schema;
use cadenza_mr::models::SongMetadata;
use cadenza_mr::services::audio::{AudioAnalyzer, AudioAnalyzerError};
use cadenza_mr::services::catalogue::{SongCatalogue, SqliteCatalogue};
use cadenza_mr::services::vector_index::{
    IndexStats, MetadataFilter, VectorBackendError, VectorEntry, VectorIndex, VectorMatch,
};
use cadenza_mr::types::{AudioInfo, Fingerprint, FingerprintMetadata, Peak};

/// Embedding dimension used throughout the tests
pub const TEST_DIMENSIONS: usize = 64;

/// Audio analyzer double returning a fixed fingerprint and probe result
pub struct FakeAudioAnalyzer {
    pub fingerprint: Fingerprint,
    pub info: AudioInfo,
    /// Byte lengths seen by generate_fingerprint, in call order
    pub fingerprint_requests: Mutex<Vec<usize>>,
}

impl FakeAudioAnalyzer {
    pub fn new() -> Self {
        Self::with_fingerprint(sample_fingerprint())
    }

    pub fn with_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            info: AudioInfo {
                duration_seconds: 5.0,
                quality: "high".to_string(),
            },
            fingerprint_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.info.duration_seconds = duration_seconds;
        self
    }
}

#[async_trait]
impl AudioAnalyzer for FakeAudioAnalyzer {
    async fn generate_fingerprint(&self, audio: &[u8]) -> Result<Fingerprint, AudioAnalyzerError> {
        self.fingerprint_requests.lock().unwrap().push(audio.len());
        Ok(self.fingerprint.clone())
    }

    async fn probe(&self, _audio: &[u8]) -> Result<AudioInfo, AudioAnalyzerError> {
        Ok(self.info.clone())
    }

    async fn health(&self) -> bool {
        true
    }
}

/// Vector index double with canned query results and recorded writes
#[derive(Default)]
pub struct FakeVectorIndex {
    pub matches: Mutex<Vec<VectorMatch>>,
    pub upserts: Mutex<Vec<Vec<VectorEntry>>>,
    pub deletes: Mutex<Vec<Vec<String>>>,
    pub queries: Mutex<Vec<(usize, Option<MetadataFilter>)>>,
    pub fail_upsert: AtomicBool,
    pub fail_query: AtomicBool,
}

impl FakeVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matches(matches: Vec<VectorMatch>) -> Self {
        Self {
            matches: Mutex::new(matches),
            ..Self::default()
        }
    }

    pub fn failing_upserts(self) -> Self {
        self.fail_upsert.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl VectorIndex for FakeVectorIndex {
    async fn upsert(
        &self,
        entries: Vec<VectorEntry>,
        _namespace: Option<&str>,
    ) -> Result<(), VectorBackendError> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(VectorBackendError("upsert rejected by test".to_string()));
        }
        self.upserts.lock().unwrap().push(entries);
        Ok(())
    }

    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        _namespace: Option<&str>,
    ) -> Result<Vec<VectorMatch>, VectorBackendError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(VectorBackendError("query rejected by test".to_string()));
        }
        self.queries.lock().unwrap().push((top_k, filter.cloned()));
        Ok(self.matches.lock().unwrap().clone())
    }

    async fn delete(
        &self,
        ids: &[String],
        _namespace: Option<&str>,
    ) -> Result<(), VectorBackendError> {
        self.deletes.lock().unwrap().push(ids.to_vec());
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, VectorBackendError> {
        Ok(IndexStats {
            total_vector_count: self.upserts.lock().unwrap().len() as u64,
            dimension: TEST_DIMENSIONS as u32,
            index_fullness: 0.0,
        })
    }
}

/// A fingerprint with a few well-spread peaks
pub fn sample_fingerprint() -> Fingerprint {
    Fingerprint {
        peaks: vec![
            Peak {
                frequency: 440.0,
                time: 0.5,
                magnitude: 2.0,
            },
            Peak {
                frequency: 8_800.0,
                time: 2.0,
                magnitude: 5.0,
            },
            Peak {
                frequency: 15_000.0,
                time: 4.2,
                magnitude: 3.0,
            },
        ],
        metadata: FingerprintMetadata {
            duration: Some(5.0),
        },
    }
}

/// A query match whose metadata carries the given song id
pub fn match_for(song_id: Uuid, score: f32) -> VectorMatch {
    match_with_raw_song_id(&song_id.to_string(), score)
}

/// A query match with arbitrary (possibly invalid) song id metadata
pub fn match_with_raw_song_id(song_id: &str, score: f32) -> VectorMatch {
    let mut metadata = Map::new();
    metadata.insert("song_id".to_string(), json!(song_id));
    VectorMatch {
        id: format!("fingerprint_{}", song_id),
        score,
        metadata,
    }
}

/// Song metadata builder
pub fn song_metadata(title: &str, artist: &str) -> SongMetadata {
    SongMetadata {
        title: title.to_string(),
        artist: artist.to_string(),
        album: None,
        genre: Some("pop".to_string()),
        language: Some("en".to_string()),
        duration: Some(180.0),
        release_date: None,
        popularity_score: 0.5,
        spotify_id: None,
        youtube_id: None,
    }
}

/// In-memory catalogue plus the underlying pool for direct SQL assertions
pub async fn memory_catalogue() -> (SqlitePool, Arc<SqliteCatalogue>) {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    initialize_schema(&pool).await.expect("Failed to initialize schema");
    (pool.clone(), Arc::new(SqliteCatalogue::new(pool)))
}

/// Seed one song and return its id
pub async fn seed_song(catalogue: &Arc<SqliteCatalogue>, title: &str) -> Uuid {
    catalogue
        .create_song(&song_metadata(title, "Test Artist"))
        .await
        .expect("Failed to seed song")
}

/// Settings suitable for tests; no network endpoints are contacted
pub fn test_settings() -> Settings {
    Settings {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: PathBuf::from(":memory:"),
        audio_engine: AudioEngineSettings {
            url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 1,
        },
        vector_db: VectorDbSettings {
            api_key: "test-key".to_string(),
            environment: "test".to_string(),
            index_name: "test-index".to_string(),
            dimensions: TEST_DIMENSIONS,
        },
        recognition: RecognitionSettings {
            threshold: 0.8,
            max_candidates: 10,
        },
        audio_limits: AudioLimits {
            min_duration_seconds: 3.0,
            max_duration_seconds: 30.0,
            max_size_bytes: 10 * 1024 * 1024,
        },
        rate_limit: RateLimitSettings {
            requests: 100,
            window_seconds: 60,
        },
    }
}
