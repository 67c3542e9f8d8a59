//! API integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use vrender_api::{create_router, ApiConfig, AppState};
use vrender_media::{FfmpegTranscoder, HttpFetcher};
use vrender_queue::JobStore;
use vrender_storage::LocalStore;
use vrender_worker::{RenderPipeline, RenderWorker, WorkerHandle};

struct TestApp {
    router: Router,
    worker: Option<RenderWorker>,
    handle: WorkerHandle,
    _dir: TempDir,
}

fn test_app(config: ApiConfig) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    let storage = Arc::new(LocalStore::new(dir.path().join("public"), None));
    let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe", 5);

    let jobs = Arc::new(JobStore::new());
    let pipeline = Arc::new(RenderPipeline::new(
        Arc::new(transcoder),
        HttpFetcher::new(5).unwrap(),
        storage.clone(),
        scratch.clone(),
        "renders",
    ));
    let worker = RenderWorker::new(Arc::clone(&jobs), pipeline);
    let handle = worker.handle();

    let state = AppState::new(
        config,
        jobs,
        handle.clone(),
        storage,
        scratch,
        "/nonexistent/ffmpeg",
    );

    TestApp {
        router: create_router(state, None),
        worker: Some(worker),
        handle,
        _dir: dir,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_submission() -> Value {
    json!({
        "sourceUrl": "https://cdn.example.com/in.mp4",
        "segments": [{"start": 0.0, "end": 2.0}, {"start": 5.0, "end": 7.5}],
        "title": "Highlights"
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(ApiConfig::default());

    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_submit_then_status_is_queued() {
    let app = test_app(ApiConfig::default());

    let (status, body) = send(&app.router, post_json("/render", &valid_submission())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert!(!job_id.is_empty());

    let (status, body) = send(&app.router, get(&format!("/render/{}/status", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobId"], job_id.as_str());
    assert_eq!(body["status"], "queued");
    assert_eq!(body["progress"], 0);
    assert!(body["finalUrl"].is_null());
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_submissions_get_distinct_ids() {
    let app = test_app(ApiConfig::default());

    let (_, first) = send(&app.router, post_json("/render", &valid_submission())).await;
    let (_, second) = send(&app.router, post_json("/render", &valid_submission())).await;

    assert_ne!(first["jobId"], second["jobId"]);
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected() {
    let app = test_app(ApiConfig::default());

    let cases = [
        json!({"sourceUrl": "https://cdn.example.com/in.mp4", "segments": []}),
        json!({
            "sourceUrl": "https://cdn.example.com/in.mp4",
            "segments": [{"start": 5.0, "end": 2.0}]
        }),
        json!({"segments": [{"start": 0.0, "end": 1.0}]}),
        json!({
            "sourceUrl": "ftp://cdn.example.com/in.mp4",
            "segments": [{"start": 0.0, "end": 1.0}]
        }),
    ];

    for case in cases {
        let (status, body) = send(&app.router, post_json("/render", &case)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", case);
        assert_eq!(body["code"], "validation_error");
        assert!(body["detail"].as_str().unwrap().starts_with("Validation error"));
    }

    // Nothing was queued
    let (_, counts) = send(&app.router, get("/render/queue")).await;
    assert_eq!(counts["total"], 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app(ApiConfig::default());

    let request = Request::builder()
        .method("POST")
        .uri("/render")
        .header("content-type", "application/json")
        .body(Body::from("{\"sourceUrl\": "))
        .unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = test_app(ApiConfig::default());

    let (status, body) = send(&app.router, get("/render/does-not-exist/status")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_queue_status_counts() {
    let app = test_app(ApiConfig::default());

    for _ in 0..3 {
        send(&app.router, post_json("/render", &valid_submission())).await;
    }

    let (status, body) = send(&app.router, get("/render/queue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queued"], 3);
    assert_eq!(body["processing"], 0);
    assert_eq!(body["total"], 3);
    assert!(body["inFlight"].is_null());
    assert_eq!(body["workerRunning"], false);
}

#[tokio::test]
async fn test_ready_degraded_without_worker_or_ffmpeg() {
    let app = test_app(ApiConfig::default());

    let (status, body) = send(&app.router, get("/ready")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["scratch"]["status"], "ok");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
    assert_eq!(body["checks"]["worker"]["status"], "error");
    assert_eq!(body["checks"]["ffmpeg"]["status"], "error");
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let app = test_app(ApiConfig::default());

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-123");
}

#[tokio::test]
async fn test_rate_limiting() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        rate_limit_burst: 2,
        ..ApiConfig::default()
    };
    let app = test_app(config);

    let limited = || {
        Request::builder()
            .uri("/render/queue")
            .header("x-forwarded-for", "192.168.1.100")
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(send(&app.router, limited()).await.0, StatusCode::OK);
    assert_eq!(send(&app.router, limited()).await.0, StatusCode::OK);

    let response = app.router.clone().oneshot(limited()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "1");

    // Health checks are not rate limited
    let request = Request::builder()
        .uri("/health")
        .header("x-forwarded-for", "192.168.1.100")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app.router, request).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_source_ends_in_error() {
    let mut app = test_app(ApiConfig::default());
    let worker = app.worker.take().unwrap();
    let task = tokio::spawn(worker.run());

    let submission = json!({
        "sourceUrl": "http://127.0.0.1:1/in.mp4",
        "segments": [{"start": 0.0, "end": 1.0}]
    });
    let (status, body) = send(&app.router, post_json("/render", &submission)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let uri = format!("/render/{}/status", body["jobId"].as_str().unwrap());

    let mut last = Value::Null;
    for _ in 0..200 {
        let (_, body) = send(&app.router, get(&uri)).await;
        if body["status"] == "error" {
            last = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    assert_eq!(last["status"], "error");
    assert!(last["finalUrl"].is_null());
    assert!(last["error"].as_str().unwrap().starts_with("Fetch failed"));

    app.handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}
