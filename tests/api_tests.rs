// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Integration tests for the full router
//!
//! Auth gating, artifact round trips, bulk query, events, status, health,
//! request ids and timeouts, driven through `tower::ServiceExt::oneshot`.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::io::AsyncRead;
use tower::ServiceExt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use turbo_cache_server::{
    api,
    config::AppConfig,
    models::ArtifactHash,
    state::AppState,
    storage::{
        ArtifactStore, FileSystemStore, StorageError, StoragePaths, StorageResult, StoredArtifact,
    },
};

const TOKEN: &str = "team-secret";

/// In-memory log sink for a scoped `tracing` subscriber.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

struct TestApp {
    _dir: tempfile::TempDir,
    state: AppState,
    router: axum::Router,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemStore::open(StoragePaths::new(dir.path()))
            .await
            .unwrap();
        let state = AppState::new(AppConfig::new(TOKEN, dir.path()), store);
        let router = api::app(state.clone());
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn upload(&self, hash: &str, body: &'static [u8]) -> Response<Body> {
        self.send(
            authed(Method::PUT, &format!("/v8/artifacts/{hash}"))
                .header(header::CONTENT_LENGTH, body.len())
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

fn authed(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    authed(Method::POST, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn all_cache_routes() -> Vec<(Method, &'static str)> {
    vec![
        (Method::GET, "/v8/artifacts/abc123"),
        (Method::PUT, "/v8/artifacts/abc123"),
        (Method::HEAD, "/v8/artifacts/abc123"),
        (Method::POST, "/v8/artifacts"),
        (Method::POST, "/v8/artifacts/events"),
        (Method::GET, "/v8/artifacts/status"),
        // Wrong methods still need the token first.
        (Method::DELETE, "/v8/artifacts/abc123"),
        (Method::GET, "/v8/artifacts"),
        (Method::GET, "/v8/artifacts/events"),
        (Method::POST, "/v8/artifacts/status"),
        // So do paths under the prefix that match no route.
        (Method::PUT, "/v8/artifacts/a/b"),
        (Method::GET, "/v8/artifacts/a/b"),
        (Method::PUT, "/v8/artifacts/"),
        (Method::GET, "/v8/artifacts/"),
    ]
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn missing_token_is_rejected_everywhere() {
    let app = TestApp::new().await;
    for (method, uri) in all_cache_routes() {
        let response = app
            .send(
                Request::builder()
                    .method(method.clone())
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn wrong_token_is_rejected_everywhere() {
    let app = TestApp::new().await;
    for header_value in ["Bearer wrong", "Bearer ", "Basic dGVhbS1zZWNyZXQ=", TOKEN] {
        for (method, uri) in all_cache_routes() {
            let response = app
                .send(
                    Request::builder()
                        .method(method.clone())
                        .uri(uri)
                        .header(header::AUTHORIZATION, header_value)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await;
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "{method} {uri} with {header_value:?}"
            );
        }
    }
}

#[tokio::test]
async fn rejected_upload_writes_nothing() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::builder()
                .method(Method::PUT)
                .uri("/v8/artifacts/abc123")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .header(header::CONTENT_LENGTH, 5)
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let hash = ArtifactHash::parse("abc123").unwrap();
    assert!(!app.state.store.exists(&hash).await.unwrap());
}

#[tokio::test]
async fn unauthorized_body_is_json_error() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::builder()
                .uri("/v8/artifacts/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rejection_is_logged_once() {
    let app = TestApp::new().await;
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(BoxMakeWriter::new(move || writer.clone()))
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = app
        .send(
            Request::builder()
                .method(Method::PUT)
                .uri("/v8/artifacts/abc123")
                .header(header::CONTENT_LENGTH, 5)
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let logs = capture.contents();
    let access_lines: Vec<&str> = logs.lines().filter(|l| l.contains("status=")).collect();
    assert_eq!(access_lines.len(), 1, "{logs}");
    assert!(access_lines[0].contains("status=401"), "{logs}");
    assert!(access_lines[0].contains("method=PUT"), "{logs}");
    assert!(access_lines[0].contains("path=/v8/artifacts/abc123"), "{logs}");
}

// -- Artifacts ----------------------------------------------------------------

#[tokio::test]
async fn upload_download_check_and_query() {
    let app = TestApp::new().await;

    let response = app.upload("abc123", b"hello").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        body_json(response).await,
        json!({"urls": ["https://api.vercel.com/v2/now/artifact/abc123"]})
    );

    let response = app
        .send(
            authed(Method::GET, "/v8/artifacts/abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, b"hello");

    let response = app
        .send(
            authed(Method::HEAD, "/v8/artifacts/abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    let response = app
        .send(json_request(
            "/v8/artifacts",
            r#"{"hashes":["abc123","zzz999"]}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "abc123": {"size": 5},
            "zzz999": {"error": {"message": "Artifact not found"}}
        })
    );
}

#[tokio::test]
async fn missing_artifact_is_404() {
    let app = TestApp::new().await;

    for method in [Method::GET, Method::HEAD] {
        let response = app
            .send(
                authed(method.clone(), "/v8/artifacts/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn last_upload_wins() {
    let app = TestApp::new().await;

    assert_eq!(app.upload("abc123", b"first").await.status(), StatusCode::ACCEPTED);
    assert_eq!(
        app.upload("abc123", b"second!").await.status(),
        StatusCode::ACCEPTED
    );

    let response = app
        .send(
            authed(Method::GET, "/v8/artifacts/abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "7");
    assert_eq!(body_bytes(response).await, b"second!");
}

#[tokio::test]
async fn empty_artifact_round_trips() {
    let app = TestApp::new().await;
    assert_eq!(app.upload("empty", b"").await.status(), StatusCode::ACCEPTED);

    let response = app
        .send(json_request("/v8/artifacts", r#"{"hashes":["empty"]}"#))
        .await;
    assert_eq!(body_json(response).await, json!({"empty": {"size": 0}}));
}

#[tokio::test]
async fn upload_without_content_length_is_400() {
    let app = TestApp::new().await;
    let response = app
        .send(
            authed(Method::PUT, "/v8/artifacts/abc123")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let hash = ArtifactHash::parse("abc123").unwrap();
    assert!(!app.state.store.exists(&hash).await.unwrap());
}

#[tokio::test]
async fn traversal_hashes_are_rejected() {
    let app = TestApp::new().await;
    for uri in ["/v8/artifacts/..", "/v8/artifacts/.staging", "/v8/artifacts/a%2Fb"] {
        let response = app
            .send(authed(Method::GET, uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn empty_query_returns_empty_object() {
    let app = TestApp::new().await;
    let response = app
        .send(json_request("/v8/artifacts", r#"{"hashes":[]}"#))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = TestApp::new().await;
    for uri in ["/v8/artifacts", "/v8/artifacts/events"] {
        let response = app.send(json_request(uri, "{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn authenticated_wrong_method_is_405() {
    let app = TestApp::new().await;
    for (method, uri) in [
        (Method::DELETE, "/v8/artifacts/abc123"),
        (Method::GET, "/v8/artifacts"),
        (Method::GET, "/v8/artifacts/events"),
        (Method::POST, "/v8/artifacts/status"),
    ] {
        let response = app
            .send(authed(method.clone(), uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} {uri}"
        );
        assert_eq!(body_json(response).await["error"], "Method not allowed");
    }
}

#[tokio::test]
async fn unknown_cache_paths_are_404_with_token() {
    let app = TestApp::new().await;
    for uri in ["/v8/artifacts/a/b", "/v8/artifacts/"] {
        let response = app
            .send(authed(Method::GET, uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn query_without_hashes_is_empty_object() {
    let app = TestApp::new().await;
    for body in ["{}", r#"{"hashes":null}"#] {
        let response = app.send(json_request("/v8/artifacts", body)).await;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(body_json(response).await, json!({}));
    }
}

// -- Events, status, health ---------------------------------------------------

#[tokio::test]
async fn events_are_accepted() {
    let app = TestApp::new().await;
    let response = app
        .send(json_request(
            "/v8/artifacts/events",
            r#"[{"sessionId":"s1","source":"LOCAL","event":"HIT","hash":"abc123","duration":12}]"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn events_with_unknown_values_are_accepted() {
    let app = TestApp::new().await;
    let response = app
        .send(json_request(
            "/v8/artifacts/events",
            r#"[{"source":"CACHE","event":"HIT","hash":"abc123"},{"source":"LOCAL"}]"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_reports_enabled() {
    let app = TestApp::new().await;
    let response = app
        .send(
            authed(Method::GET, "/v8/artifacts/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "enabled"}));
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::new().await;
    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_public() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::builder()
                .uri("/api-doc/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/v8/artifacts/{hash}"].is_object());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new().await;

    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert!(response.headers().contains_key("x-request-id"));

    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

// -- Storage failures ---------------------------------------------------------

/// Store whose every operation fails with an IO error, or stalls.
struct BrokenStore {
    stall: bool,
}

impl BrokenStore {
    async fn fail<T>(&self) -> StorageResult<T> {
        if self.stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Err(StorageError::Io(io::Error::other("disk on fire")))
    }
}

#[async_trait]
impl ArtifactStore for BrokenStore {
    async fn store(
        &self,
        _hash: &ArtifactHash,
        _body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        self.fail().await
    }

    async fn retrieve(&self, _hash: &ArtifactHash) -> StorageResult<StoredArtifact> {
        self.fail().await
    }

    async fn exists(&self, _hash: &ArtifactHash) -> StorageResult<bool> {
        self.fail().await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.fail().await
    }
}

fn broken_app(stall: bool, timeout: Duration) -> axum::Router {
    let mut config = AppConfig::new(TOKEN, "/nonexistent");
    config.request_timeout = timeout;
    api::app(AppState::new(config, BrokenStore { stall }))
}

#[tokio::test]
async fn storage_errors_are_500() {
    let app = broken_app(false, Duration::from_secs(30));

    let response = app
        .clone()
        .oneshot(
            authed(Method::GET, "/v8/artifacts/abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal server error");

    let response = app
        .clone()
        .oneshot(
            authed(Method::PUT, "/v8/artifacts/abc123")
                .header(header::CONTENT_LENGTH, 5)
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Bulk query degrades to "not found" rather than failing the batch.
    let response = app
        .oneshot(json_request("/v8/artifacts", r#"{"hashes":["abc123"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"abc123": {"error": {"message": "Artifact not found"}}})
    );
}

#[tokio::test]
async fn slow_requests_time_out() {
    let app = broken_app(true, Duration::from_millis(50));
    let response = app
        .oneshot(
            authed(Method::GET, "/v8/artifacts/abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
