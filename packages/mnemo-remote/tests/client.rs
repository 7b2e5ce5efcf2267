use std::{
	collections::HashMap,
	net::SocketAddr,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	routing::{get, post},
};
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use mnemo_config::{EmbeddingProviderConfig, Remote, Retry};
use mnemo_remote::{Error, RemoteClient, RetryPolicy, embedding};

#[derive(Clone)]
struct FlakyBackend {
	list_calls: Arc<AtomicUsize>,
	search_calls: Arc<AtomicUsize>,
	failures_before_success: usize,
	failure_status: StatusCode,
}

async fn list(
	State(backend): State<FlakyBackend>,
	Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
	let call = backend.list_calls.fetch_add(1, Ordering::SeqCst);

	if call < backend.failures_before_success {
		return (backend.failure_status, Json(serde_json::json!({ "error": "boom" })));
	}

	let page = match params.get("cursor").map(String::as_str) {
		None => serde_json::json!({
			"items": [{
				"type": "document",
				"id": "doc-1",
				"content": "First page.",
				"created_at": "2026-01-01T00:00:00Z"
			}],
			"next_cursor": "page-2"
		}),
		Some("page-2") => serde_json::json!({
			"items": [{
				"type": "interaction",
				"id": "int-1",
				"user_id": params.get("limit").cloned().unwrap_or_default(),
				"summary": "Second page.",
				"created_at": "2026-01-02T00:00:00Z"
			}],
			"next_cursor": null
		}),
		Some(_) => return (StatusCode::BAD_REQUEST, Json(serde_json::json!({}))),
	};

	(StatusCode::OK, Json(page))
}

async fn search(State(backend): State<FlakyBackend>, Json(body): Json<Value>) -> Json<Value> {
	backend.search_calls.fetch_add(1, Ordering::SeqCst);

	assert_eq!(body["query"], "deploy failure");

	Json(serde_json::json!({ "items": [] }))
}

async fn embeddings(Json(body): Json<Value>) -> Json<Value> {
	assert_eq!(body["input"], "deploy failure");
	assert_eq!(body["model"], "embed-small");

	Json(serde_json::json!({ "data": [{ "index": 0, "embedding": [0.6, 0.8] }] }))
}

async fn spawn_backend(backend: FlakyBackend) -> SocketAddr {
	let app = Router::new()
		.route("/v1/memories", get(list))
		.route("/v1/memories/search", post(search))
		.route("/v1/embeddings", post(embeddings))
		.with_state(backend);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test backend.");
	let addr = listener.local_addr().expect("Failed to read local address.");

	tokio::spawn(async move {
		axum::serve(listener, app).await.expect("Test backend failed.");
	});

	addr
}

fn remote_config(addr: SocketAddr) -> Remote {
	Remote {
		api_base: format!("http://{addr}"),
		api_key: "test-key".to_string(),
		list_path: "/v1/memories".to_string(),
		search_path: "/v1/memories/search".to_string(),
		page_size: 25,
		timeout_ms: 2_000,
		default_headers: Map::new(),
		retry: Retry { max_retries: 3, base_backoff_ms: 1, max_backoff_ms: 4 },
	}
}

fn backend(failures_before_success: usize, failure_status: StatusCode) -> FlakyBackend {
	FlakyBackend {
		list_calls: Arc::new(AtomicUsize::new(0)),
		search_calls: Arc::new(AtomicUsize::new(0)),
		failures_before_success,
		failure_status,
	}
}

#[tokio::test]
async fn fetch_page_retries_server_errors() {
	let backend = backend(2, StatusCode::INTERNAL_SERVER_ERROR);
	let calls = backend.list_calls.clone();
	let addr = spawn_backend(backend).await;
	let client = RemoteClient::new(&remote_config(addr)).expect("Failed to build client.");
	let page = client.fetch_page(None).await.expect("fetch_page should recover");

	assert_eq!(calls.load(Ordering::SeqCst), 3);
	assert_eq!(page.items.len(), 1);
	assert_eq!(page.next_cursor.as_deref(), Some("page-2"));
}

#[tokio::test]
async fn fetch_page_follows_cursor_and_sends_page_size() {
	let addr = spawn_backend(backend(0, StatusCode::OK)).await;
	let client = RemoteClient::new(&remote_config(addr)).expect("Failed to build client.");
	let page = client.fetch_page(Some("page-2")).await.expect("fetch_page failed");
	let record = page.items.into_iter().next().expect("missing item").into_record("system");

	assert!(page.next_cursor.is_none());
	assert_eq!(record.id, "int-1");
	assert_eq!(record.owner_id, "25");
}

#[tokio::test]
async fn fetch_page_surfaces_exhausted_transient_failure() {
	let backend = backend(usize::MAX, StatusCode::SERVICE_UNAVAILABLE);
	let calls = backend.list_calls.clone();
	let addr = spawn_backend(backend).await;
	let client = RemoteClient::new(&remote_config(addr)).expect("Failed to build client.");
	let err = client.fetch_page(None).await.expect_err("fetch_page should fail");

	assert!(matches!(err, Error::Transient { status: Some(503), .. }));
	assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn fetch_page_does_not_retry_client_errors() {
	let backend = backend(usize::MAX, StatusCode::FORBIDDEN);
	let calls = backend.list_calls.clone();
	let addr = spawn_backend(backend).await;
	let client = RemoteClient::new(&remote_config(addr)).expect("Failed to build client.");
	let err = client.fetch_page(None).await.expect_err("fetch_page should fail");

	assert!(matches!(err, Error::Permanent { status: Some(403), .. }));
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_backend_is_transient() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind.");
	let addr = listener.local_addr().expect("Failed to read local address.");

	drop(listener);

	let client = RemoteClient::new(&remote_config(addr))
		.expect("Failed to build client.")
		.with_retry(RetryPolicy::none());
	let err = client.fetch_page(None).await.expect_err("fetch_page should fail");

	assert!(matches!(err, Error::Transient { status: None, .. }));
}

#[tokio::test]
async fn raw_search_returns_empty_results_without_error() {
	let backend = backend(0, StatusCode::OK);
	let calls = backend.search_calls.clone();
	let addr = spawn_backend(backend).await;
	let client = RemoteClient::new(&remote_config(addr)).expect("Failed to build client.");
	let items = client.raw_search("deploy failure", 10).await.expect("search failed");

	assert!(items.is_empty());
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn embed_query_returns_single_vector() {
	let addr = spawn_backend(backend(0, StatusCode::OK)).await;
	let cfg = EmbeddingProviderConfig {
		api_base: format!("http://{addr}"),
		api_key: "test-key".to_string(),
		path: "/v1/embeddings".to_string(),
		model: "embed-small".to_string(),
		dimensions: 2,
		timeout_ms: 2_000,
		default_headers: Map::new(),
	};
	let vector = embedding::embed_query(&cfg, "deploy failure").await.expect("embed failed");

	assert_eq!(vector, vec![0.6, 0.8]);

	let err = embedding::embed_query(&EmbeddingProviderConfig { dimensions: 3, ..cfg }, "deploy failure")
		.await
		.expect_err("dimension mismatch should fail");

	assert!(matches!(err, Error::InvalidResponse { .. }));
}
