//! HTTP vector index client tests
//!
//! Runs the client against a local stub backend that records every request,
//! verifying wire shapes, authentication, chunking, and error collapsing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use cadenza_mr::services::vector_index::{
    HttpVectorIndex, MetadataFilter, VectorEntry, VectorIndex,
};

/// One recorded backend request
#[derive(Debug, Clone)]
struct RecordedRequest {
    path: &'static str,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct StubState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Upsert call index (0-based) from which the stub starts failing
    fail_upserts_from: Arc<AtomicUsize>,
    upsert_calls: Arc<AtomicUsize>,
    /// Canned /query response
    query_response: Arc<Mutex<Value>>,
    /// When set, every stats call returns 500
    fail_stats: Arc<AtomicUsize>,
}

impl StubState {
    fn new() -> Self {
        let state = Self::default();
        state.fail_upserts_from.store(usize::MAX, Ordering::SeqCst);
        *state.query_response.lock().unwrap() = json!({ "matches": [] });
        state
    }

    fn record(&self, path: &'static str, headers: &HeaderMap, body: Value) {
        self.requests.lock().unwrap().push(RecordedRequest {
            path,
            api_key: headers
                .get("Api-Key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
    }
}

async fn stub_stats(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, axum::http::StatusCode> {
    state.record("/describe_index_stats", &headers, body);
    if state.fail_stats.load(Ordering::SeqCst) > 0 {
        return Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!({
        "total_vector_count": 1234,
        "dimension": 64,
        "index_fullness": 0.25,
    })))
}

async fn stub_upsert(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, axum::http::StatusCode> {
    state.record("/vectors/upsert", &headers, body);
    let call = state.upsert_calls.fetch_add(1, Ordering::SeqCst);
    if call >= state.fail_upserts_from.load(Ordering::SeqCst) {
        return Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!({ "upsertedCount": 1 })))
}

async fn stub_query(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record("/query", &headers, body);
    Json(state.query_response.lock().unwrap().clone())
}

async fn stub_delete(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record("/vectors/delete", &headers, body);
    Json(json!({}))
}

/// Bind the stub backend on an ephemeral port and return its base URL
async fn spawn_stub(state: StubState) -> String {
    let app = Router::new()
        .route("/describe_index_stats", post(stub_stats))
        .route("/vectors/upsert", post(stub_upsert))
        .route("/query", post(stub_query))
        .route("/vectors/delete", post(stub_delete))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn entry(i: usize) -> VectorEntry {
    VectorEntry {
        id: format!("fingerprint_{}", i),
        values: vec![0.5; 8],
        metadata: Map::new(),
    }
}

#[tokio::test]
async fn test_stats_parses_backend_response() {
    let stub = StubState::new();
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "secret-key").unwrap();

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total_vector_count, 1234);
    assert_eq!(stats.dimension, 64);
    assert!((stats.index_fullness - 0.25).abs() < f32::EPSILON);

    // The Api-Key header authenticates every call
    let requests = stub.requests.lock().unwrap();
    assert_eq!(requests[0].api_key.as_deref(), Some("secret-key"));
}

#[tokio::test]
async fn test_health_tracks_stats() {
    let stub = StubState::new();
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "key").unwrap();

    assert!(client.health().await);

    stub.fail_stats.store(1, Ordering::SeqCst);
    assert!(!client.health().await);
}

#[tokio::test]
async fn test_query_wire_shape_and_parsing() {
    let stub = StubState::new();
    let song_id = Uuid::new_v4();
    *stub.query_response.lock().unwrap() = json!({
        "matches": [
            { "id": format!("fingerprint_{}", song_id), "score": 0.93,
              "metadata": { "song_id": song_id.to_string(), "title": "Hit" } },
            { "id": "fingerprint_other", "score": 0.41, "metadata": {} },
        ]
    });
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "key").unwrap();

    let filter = MetadataFilter {
        language: Some("en".to_string()),
        genre: None,
    };
    let matches = client
        .query(&[0.1, 0.2, 0.3], 5, Some(&filter), Some("prod"))
        .await
        .unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].song_id(), Some(song_id.to_string().as_str()));
    assert!((matches[0].score - 0.93).abs() < f32::EPSILON);

    let requests = stub.requests.lock().unwrap();
    let body = &requests[0].body;
    assert_eq!(body["top_k"], json!(5));
    assert_eq!(body["include_metadata"], json!(true));
    assert_eq!(body["namespace"], json!("prod"));
    assert_eq!(body["filter"], json!({ "language": "en" }));
    assert_eq!(body["vector"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_query_without_filter_omits_the_field() {
    let stub = StubState::new();
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "key").unwrap();

    client.query(&[0.0; 4], 10, None, None).await.unwrap();

    let requests = stub.requests.lock().unwrap();
    let body = requests[0].body.as_object().unwrap();
    assert!(!body.contains_key("filter"));
    assert!(!body.contains_key("namespace"));
}

#[tokio::test]
async fn test_upsert_chunks_at_one_hundred_entries() {
    let stub = StubState::new();
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "key").unwrap();

    let entries: Vec<_> = (0..250).map(entry).collect();
    client.upsert(entries, None).await.unwrap();

    let requests = stub.requests.lock().unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .filter(|r| r.path == "/vectors/upsert")
        .map(|r| r.body["vectors"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);
}

#[tokio::test]
async fn test_upsert_stops_after_failed_chunk() {
    let stub = StubState::new();
    stub.fail_upserts_from.store(1, Ordering::SeqCst);
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "key").unwrap();

    let entries: Vec<_> = (0..250).map(entry).collect();
    let result = client.upsert(entries, None).await;
    assert!(result.is_err());

    // First chunk succeeded, second failed, third never submitted
    let upsert_count = stub
        .requests
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.path == "/vectors/upsert")
        .count();
    assert_eq!(upsert_count, 2);
}

#[tokio::test]
async fn test_delete_sends_ids() {
    let stub = StubState::new();
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "key").unwrap();

    let ids = vec!["fingerprint_a".to_string(), "fingerprint_b".to_string()];
    client.delete(&ids, None).await.unwrap();

    let requests = stub.requests.lock().unwrap();
    assert_eq!(requests[0].path, "/vectors/delete");
    assert_eq!(
        requests[0].body["ids"],
        json!(["fingerprint_a", "fingerprint_b"])
    );
}

#[tokio::test]
async fn test_non_success_status_becomes_backend_error() {
    let stub = StubState::new();
    stub.fail_stats.store(1, Ordering::SeqCst);
    let base_url = spawn_stub(stub.clone()).await;
    let client = HttpVectorIndex::with_base_url(base_url, "key").unwrap();

    let err = client.stats().await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_unreachable_backend_becomes_backend_error() {
    // Nothing listens on this port
    let client = HttpVectorIndex::with_base_url("http://127.0.0.1:1", "key").unwrap();
    let err = client.stats().await.unwrap_err();
    assert!(err.to_string().contains("describe_index_stats"));
}
