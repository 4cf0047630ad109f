//! Vector index client
//!
//! Thin client over the hosted vector-search backend. All operations are
//! JSON POSTs against one host, authenticated with an `Api-Key` header.
//! Every failure mode (transport, non-success status, malformed body)
//! collapses into a single `VectorBackendError`; retry policy, if any,
//! belongs to callers.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::VectorDbSettings;

/// Maximum vectors per upsert request; larger batches are chunked
pub const MAX_UPSERT_BATCH: usize = 100;

/// Deadline for every outbound backend call
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Any failure of the vector backend, with the originating message attached
#[derive(Debug, Error)]
#[error("Vector backend error: {0}")]
pub struct VectorBackendError(pub String);

/// One stored vector with its payload metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

impl VectorEntry {
    /// Build the index entry for a song's fingerprint embedding.
    ///
    /// The id is a deterministic function of the song id, so re-ingesting a
    /// song replaces its entry instead of accumulating duplicates. The
    /// caller's metadata is extended with `song_id`, a fresh
    /// `fingerprint_id`, and the insertion wall-clock.
    pub fn for_song(song_id: Uuid, values: Vec<f32>, base_metadata: Map<String, Value>) -> Self {
        let mut metadata = base_metadata;
        metadata.insert("song_id".to_string(), json!(song_id.to_string()));
        metadata.insert(
            "fingerprint_id".to_string(),
            json!(Uuid::new_v4().to_string()),
        );
        metadata.insert(
            "created_at".to_string(),
            json!(Utc::now().timestamp_millis() as f64 / 1000.0),
        );

        Self {
            id: fingerprint_entry_id(song_id),
            values,
            metadata,
        }
    }
}

/// Index entry id for a song's fingerprint
pub fn fingerprint_entry_id(song_id: Uuid) -> String {
    format!("fingerprint_{}", song_id)
}

/// One query match, ordered by the backend by descending score
#[derive(Debug, Clone, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    /// Backend-defined similarity in [-1, 1]; treated monotonically
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl VectorMatch {
    /// The `song_id` metadata field, if present and a string
    pub fn song_id(&self) -> Option<&str> {
        self.metadata.get("song_id").and_then(Value::as_str)
    }
}

/// Index-wide statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: u32,
    #[serde(default)]
    pub index_fullness: f32,
}

/// Equality conjunction over metadata fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pub language: Option<String>,
    pub genre: Option<String>,
}

impl MetadataFilter {
    /// Filter on language only
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            genre: None,
        }
    }

    /// Wire representation, or `None` when no field is constrained
    pub fn to_value(&self) -> Option<Value> {
        let mut filter = Map::new();
        if let Some(language) = &self.language {
            filter.insert("language".to_string(), json!(language));
        }
        if let Some(genre) = &self.genre {
            filter.insert("genre".to_string(), json!(genre));
        }
        if filter.is_empty() {
            None
        } else {
            Some(Value::Object(filter))
        }
    }
}

/// Operations against the vector index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Write entries; idempotent per id (a re-upsert replaces). Batches over
    /// `MAX_UPSERT_BATCH` are chunked and submitted sequentially; on a chunk
    /// failure later chunks are not attempted, so callers must treat a bulk
    /// upsert as potentially partially applied.
    async fn upsert(
        &self,
        entries: Vec<VectorEntry>,
        namespace: Option<&str>,
    ) -> Result<(), VectorBackendError>;

    /// Return up to `top_k` matches ordered by descending score
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        namespace: Option<&str>,
    ) -> Result<Vec<VectorMatch>, VectorBackendError>;

    /// Remove entries by id; missing ids are not an error
    async fn delete(&self, ids: &[String], namespace: Option<&str>)
        -> Result<(), VectorBackendError>;

    async fn stats(&self) -> Result<IndexStats, VectorBackendError>;

    async fn health(&self) -> bool {
        self.stats().await.is_ok()
    }
}

/// HTTP client for the hosted vector backend
pub struct HttpVectorIndex {
    http_client: Client,
    base_url: String,
}

impl HttpVectorIndex {
    pub fn new(settings: &VectorDbSettings) -> Result<Self, VectorBackendError> {
        Self::with_base_url(settings.base_url(), &settings.api_key)
    }

    /// Client against an explicit endpoint; used directly by tests
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: &str,
    ) -> Result<Self, VectorBackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key)
                .map_err(|e| VectorBackendError(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| VectorBackendError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, VectorBackendError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| VectorBackendError(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorBackendError(format!(
                "Backend returned {} for {}: {}",
                status, path, body
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| VectorBackendError(format!("Malformed response from {}: {}", path, e)))
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(
        &self,
        entries: Vec<VectorEntry>,
        namespace: Option<&str>,
    ) -> Result<(), VectorBackendError> {
        for chunk in entries.chunks(MAX_UPSERT_BATCH) {
            let request = UpsertRequest {
                vectors: chunk,
                namespace,
            };
            let _: Value = self.post_json("/vectors/upsert", &request).await?;
            debug!(count = chunk.len(), "Upserted vector chunk");
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        namespace: Option<&str>,
    ) -> Result<Vec<VectorMatch>, VectorBackendError> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            namespace,
            filter: filter.and_then(MetadataFilter::to_value),
        };
        let response: QueryResponse = self.post_json("/query", &request).await?;
        debug!(matches = response.matches.len(), "Vector query complete");
        Ok(response.matches)
    }

    async fn delete(
        &self,
        ids: &[String],
        namespace: Option<&str>,
    ) -> Result<(), VectorBackendError> {
        let request = DeleteRequest { ids, namespace };
        let _: Value = self.post_json("/vectors/delete", &request).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, VectorBackendError> {
        self.post_json("/describe_index_stats", &json!({})).await
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}
