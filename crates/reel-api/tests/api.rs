//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use reel_api::{create_router, ApiConfig, AppState};
use reel_worker::stub::MOCK_VIDEO_URL;
use reel_worker::{Collaborators, JobExecutor, JobStore, WorkerConfig};

fn mock_app(rate_limit_rps: u32) -> Router {
    let config = ApiConfig {
        mock_mode: true,
        rate_limit_rps,
        ..ApiConfig::default()
    };
    create_router(AppState::from_config(config, WorkerConfig::default()), None)
}

fn unconfigured_app() -> Router {
    let executor = JobExecutor::new(
        WorkerConfig::default(),
        Arc::new(JobStore::new()),
        Collaborators::default(),
    );
    create_router(AppState::new(ApiConfig::default(), Arc::new(executor)), None)
}

fn generate_request(body: Value, client_ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Forwarded-For", client_ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test(start_paused = true)]
async fn test_generate_then_poll_until_completed() {
    let app = mock_app(100);

    let (status, body) = send(
        &app,
        generate_request(
            json!({ "script": "A cat sat. A dog ran.", "style": "anime" }),
            "203.0.113.1",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "QUEUED");
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for _ in 0..120 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let (status, body) = send(&app, get_request(&format!("/status/{}", job_id))).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
        if last["status"] == "COMPLETED" || last["status"] == "FAILED" {
            break;
        }
    }

    assert_eq!(last["status"], "COMPLETED");
    assert_eq!(last["video_url"], MOCK_VIDEO_URL);
    assert_eq!(last["progress"], "Assembly complete. 2/2 clips successful.");
    assert_eq!(last["clips_total"], 2);
    assert_eq!(last["request"]["style"], "anime");
}

#[tokio::test]
async fn test_generate_unconfigured_returns_503() {
    let app = unconfigured_app();

    let (status, body) = send(
        &app,
        generate_request(json!({ "script": "A cat sat.", "style": "anime" }), "203.0.113.2"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("prompt_author"));
}

#[tokio::test]
async fn test_unknown_job_returns_404() {
    let app = mock_app(100);

    let (status, body) = send(&app, get_request("/status/does-not-exist")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Job ID not found");
}

#[tokio::test]
async fn test_blank_script_rejected() {
    let app = mock_app(100);

    let (status, body) = send(
        &app,
        generate_request(json!({ "script": "   ", "style": "anime" }), "203.0.113.3"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("script"));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = mock_app(100);
    let request = Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_missing_field_rejected() {
    let app = mock_app(100);

    let (status, _) = send(
        &app,
        generate_request(json!({ "script": "A cat sat." }), "203.0.113.4"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_readiness() {
    let (status, body) = send(&mock_app(100), get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["generation_ready"], true);
    assert_eq!(body["segmentation"], "fallback");
    assert_eq!(body["mock_mode"], true);

    let (status, body) = send(&unconfigured_app(), get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generation_ready"], false);
    assert_eq!(
        body["missing"],
        json!(["prompt_author", "render_gateway", "signer"])
    );
}

#[tokio::test]
async fn test_generate_is_rate_limited_per_client() {
    let app = mock_app(1);
    let body = json!({ "script": "A cat sat.", "style": "anime" });

    let (first, _) = send(&app, generate_request(body.clone(), "198.51.100.9")).await;
    let response = app
        .clone()
        .oneshot(generate_request(body.clone(), "198.51.100.9"))
        .await
        .unwrap();
    let (other_client, _) = send(&app, generate_request(body, "198.51.100.10")).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    assert_eq!(other_client, StatusCode::OK);
}

#[tokio::test]
async fn test_status_is_not_rate_limited() {
    let app = mock_app(1);
    for _ in 0..5 {
        let request = Request::builder()
            .uri("/status/unknown")
            .header("X-Forwarded-For", "198.51.100.20")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let response = mock_app(100)
        .oneshot(get_request("/health"))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
