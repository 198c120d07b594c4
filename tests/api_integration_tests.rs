//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle through the router and the worker
//! pool, plus a live server driven over TCP.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use kv_cache_server::{
    api::create_router,
    backend::{MemoryConnector, Store, StoreConnector},
    cache::{Cache, Lookup, StatsCollector},
    dispatch::WorkerPool,
    error::StoreError,
    AppState, Config, Lifecycle, Server, ShutdownHandle,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

struct TestApp {
    router: Router,
    cache: Arc<Cache>,
    pool: WorkerPool,
}

fn create_test_app(capacity: usize, connector: &dyn StoreConnector) -> TestApp {
    let cache = Arc::new(Cache::new(capacity));
    let stats = Arc::new(StatsCollector::new());
    let pool = WorkerPool::spawn(2, 16, connector, Arc::clone(&cache), Arc::clone(&stats)).unwrap();
    let state = AppState::new(pool.dispatcher(), stats, Arc::clone(&cache));
    TestApp {
        router: create_router(state),
        cache,
        pool,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn put(app: &Router, key: &str, value: &str) -> (StatusCode, Value) {
    let body = serde_json::json!({ "key": key, "value": value }).to_string();
    send(app, "POST", "/api/kv", Some(&body)).await
}

async fn get(app: &Router, key: &str) -> (StatusCode, Value) {
    send(app, "GET", &format!("/api/kv?key={}", key), None).await
}

async fn stats(app: &Router) -> Value {
    let (status, json) = send(app, "GET", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    json
}

/// Store whose every call fails with a connection error.
struct DownStore;

impl Store for DownStore {
    fn get(&mut self, _key: &str) -> Result<Lookup, StoreError> {
        Err(StoreError::Connection("connection reset".to_string()))
    }

    fn put(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Connection("connection reset".to_string()))
    }

    fn delete(&mut self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Connection("connection reset".to_string()))
    }
}

struct DownConnector;

impl StoreConnector for DownConnector {
    fn connect(&self) -> Result<Box<dyn Store>, StoreError> {
        Ok(Box::new(DownStore))
    }

    fn describe(&self) -> String {
        "down".to_string()
    }
}

// == Write Endpoint Tests ==

#[tokio::test]
async fn test_put_endpoint_success() {
    let connector = MemoryConnector::new();
    let app = create_test_app(10, &connector);

    let (status, json) = put(&app.router, "test_key", "test_value").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(connector.value("test_key").as_deref(), Some("test_value"));
    assert_eq!(app.cache.peek("test_key").as_deref(), Some("test_value"));
}

#[tokio::test]
async fn test_put_overwrites_value() {
    let connector = MemoryConnector::new();
    let app = create_test_app(10, &connector);

    put(&app.router, "k", "v1").await;
    put(&app.router, "k", "v2").await;

    let (status, json) = get(&app.router, "k").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "v2");
    assert_eq!(connector.len(), 1);
}

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, json) = send(&app.router, "POST", "/api/kv", Some("not valid json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
    assert_eq!(stats(&app.router).await["total_requests"], 1);
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, json) = put(&app.router, "", "value").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid request"));
}

#[tokio::test]
async fn test_missing_value_request() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, _) = send(&app.router, "POST", "/api/kv", Some(r#"{"key":"k"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Read Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app(10, &MemoryConnector::new());
    put(&app.router, "get_key", "get_value").await;

    let (status, json) = get(&app.router, "get_key").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], "get_value");
}

#[tokio::test]
async fn test_get_empty_value_is_found() {
    let app = create_test_app(10, &MemoryConnector::new());
    put(&app.router, "blank", "").await;

    let (status, json) = get(&app.router, "blank").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, json) = get(&app.router, "nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn test_get_missing_key_parameter() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, json) = send(&app.router, "GET", "/api/kv", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_get_duplicate_key_uses_first() {
    let app = create_test_app(10, &MemoryConnector::new());
    put(&app.router, "a", "first").await;
    put(&app.router, "b", "second").await;

    let (status, json) = send(&app.router, "GET", "/api/kv?key=a&key=b", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "a");
    assert_eq!(json["value"], "first");
    assert_eq!(stats(&app.router).await["total_requests"], 3);
}

#[tokio::test]
async fn test_get_empty_key_parameter_is_counted() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, json) = send(&app.router, "GET", "/api/kv?key=", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Missing key parameter"));
    assert_eq!(stats(&app.router).await["total_requests"], 1);
}

#[tokio::test]
async fn test_get_populates_cache_from_store() {
    let connector = MemoryConnector::new();
    connector.connect().unwrap().put("seeded", "from_store").unwrap();
    let app = create_test_app(10, &connector);

    let (status, json) = get(&app.router, "seeded").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "from_store");
    assert_eq!(app.cache.peek("seeded").as_deref(), Some("from_store"));

    get(&app.router, "seeded").await;
    let json = stats(&app.router).await;
    assert_eq!(json["cache_hits"], 1);
    assert_eq!(json["cache_misses"], 1);
}

// == Delete Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let connector = MemoryConnector::new();
    let app = create_test_app(10, &connector);
    put(&app.router, "delete_key", "delete_value").await;

    let (status, json) = send(&app.router, "DELETE", "/api/kv?key=delete_key", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert!(connector.value("delete_key").is_none());
    assert!(!app.cache.contains("delete_key"));

    let (status, _) = get(&app.router, "delete_key").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_absent_key_succeeds() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, _) = send(&app.router, "DELETE", "/api/kv?key=never_set", None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_missing_key_parameter() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, _) = send(&app.router, "DELETE", "/api/kv", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_duplicate_key_uses_first() {
    let connector = MemoryConnector::new();
    let app = create_test_app(10, &connector);
    put(&app.router, "a", "1").await;
    put(&app.router, "b", "2").await;

    let (status, json) = send(&app.router, "DELETE", "/api/kv?key=a&key=b", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert!(connector.value("a").is_none());
    assert_eq!(connector.value("b").as_deref(), Some("2"));
    assert_eq!(stats(&app.router).await["total_requests"], 3);
}

#[tokio::test]
async fn test_unknown_path_returns_json_error() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, json) = send(&app.router, "GET", "/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().starts_with("Not found"));
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, _) = send(&app.router, "PUT", "/api/kv?key=k", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// == Stats and Health Tests ==

#[tokio::test]
async fn test_eviction_scenario_statistics() {
    let connector = MemoryConnector::new();
    let app = create_test_app(2, &connector);

    put(&app.router, "a", "1").await;
    put(&app.router, "b", "2").await;
    let (status, _) = get(&app.router, "a").await;
    assert_eq!(status, StatusCode::OK);

    // "b" is now least recently used
    put(&app.router, "c", "3").await;
    assert!(!app.cache.contains("b"));

    // Evicted from the cache but still in the store
    let (status, json) = get(&app.router, "b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "2");

    let json = stats(&app.router).await;
    assert_eq!(json["total_requests"], 5);
    assert_eq!(json["cache_hits"], 1);
    assert_eq!(json["cache_misses"], 1);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.2).abs() < 1e-9);
    assert_eq!(json["cache_entries"], 2);
    assert_eq!(json["cache_capacity"], 2);
}

#[tokio::test]
async fn test_stats_endpoint_initial() {
    let app = create_test_app(10, &MemoryConnector::new());

    let json = stats(&app.router).await;

    assert_eq!(json["total_requests"], 0);
    assert_eq!(json["hit_rate"], 0.0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(10, &MemoryConnector::new());

    let (status, json) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Failure Tests ==

#[tokio::test]
async fn test_backend_failure_returns_500() {
    let app = create_test_app(10, &DownConnector);

    let (status, json) = put(&app.router, "k", "v").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json.get("error").is_some());
    assert!(!app.cache.contains("k"));

    let (status, _) = get(&app.router, "k").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app.router, "DELETE", "/api/kv?key=k", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json = stats(&app.router).await;
    assert_eq!(json["total_requests"], 3);
    assert_eq!(json["cache_misses"], 1);
}

#[tokio::test]
async fn test_requests_after_shutdown_return_503() {
    let app = create_test_app(10, &MemoryConnector::new());
    let router = app.router.clone();

    tokio::task::spawn_blocking(move || app.pool.join())
        .await
        .unwrap();

    let (status, json) = get(&router, "k").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json.get("error").is_some());
}

// == Live Server Tests ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_live_server_round_trip() {
    let config = Config {
        server_port: 0,
        cache_capacity: 16,
        worker_threads: 4,
        queue_depth: 32,
        store_url: "memory://".to_string(),
        stats_interval: 0,
    };
    let connector = Arc::new(MemoryConnector::new());
    let mut server = Server::new(config, connector.clone(), ShutdownHandle::new());

    let addr = server.start().await.unwrap();
    let base = format!("http://127.0.0.1:{}", addr.port());
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/kv", base))
        .json(&serde_json::json!({ "key": "live", "value": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .get(format!("{}/api/kv", base))
        .query(&[("key", "live")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["value"], "hello");

    let response = client
        .delete(format!("{}/api/kv?key=live", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(connector.value("live").is_none());

    drop(client);
    let snapshot = server.stop().await.unwrap();
    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(server.state(), Lifecycle::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_live_server_concurrent_clients() {
    let config = Config {
        server_port: 0,
        cache_capacity: 8,
        worker_threads: 4,
        queue_depth: 4,
        store_url: "memory://".to_string(),
        stats_interval: 0,
    };
    let mut server = Server::new(config, Arc::new(MemoryConnector::new()), ShutdownHandle::new());
    let addr = server.start().await.unwrap();
    let base = format!("http://127.0.0.1:{}", addr.port());
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..50 {
        let client = client.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("key{}", i % 10);
            client
                .post(format!("{}/api/kv", base))
                .json(&serde_json::json!({ "key": key, "value": format!("v{}", i) }))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), reqwest::StatusCode::OK);
    }

    drop(client);
    let snapshot = server.stop().await.unwrap();
    assert_eq!(snapshot.total_requests, 50);
}
