//! Relay endpoint integration tests
//!
//! Tests for `POST /api/openai` forwarding:
//! - Upstream status and body relayed unmodified
//! - Upstream credential attached, client token never forwarded
//! - Timeout maps to 504 without retry
//! - Transport failures map to 500 with the error text

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, StatusCode};
use axum_test::TestServer;
use keyhole::routes::create_router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header as header_matcher, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    build_state, constants, test_data, token_header, upstream_mocks, valid_token, TestHarness,
    TestSettings,
};

#[tokio::test]
async fn test_success_body_relayed_unmodified() {
    let harness = TestHarness::new().await;
    upstream_mocks::mock_completion(&harness.upstream, 1).await;

    let response = harness
        .server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .json(&test_data::chat_request())
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), upstream_mocks::COMPLETION_BODY);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_upstream_receives_credential_and_original_body() {
    let harness = TestHarness::new().await;
    let payload = test_data::chat_request();

    Mock::given(method("POST"))
        .and(path(constants::UPSTREAM_PATH))
        .and(header_matcher(
            "authorization",
            format!("Bearer {}", constants::TEST_UPSTREAM_KEY).as_str(),
        ))
        .and(header_matcher("content-type", "application/json"))
        .and(body_json(&payload))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(upstream_mocks::COMPLETION_BODY, "application/json"),
        )
        .expect(1)
        .mount(&harness.upstream)
        .await;

    harness
        .server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .json(&payload)
        .await
        .assert_status_ok();

    let received = harness.upstream.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("x-api-token"));
}

#[tokio::test]
async fn test_upstream_error_status_relayed() {
    let harness = TestHarness::new().await;
    let upstream_error = r#"{"error":{"message":"Invalid model","type":"invalid_request_error"}}"#;

    Mock::given(method("POST"))
        .and(path(constants::UPSTREAM_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_raw(upstream_error, "application/json"))
        .expect(1)
        .mount(&harness.upstream)
        .await;

    let response = harness
        .server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .json(&test_data::chat_request())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), upstream_error);
}

#[tokio::test]
async fn test_upstream_server_error_relayed_without_retry() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path(constants::UPSTREAM_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_raw(r#"{"error":"overloaded"}"#, "application/json"),
        )
        .expect(1)
        .mount(&harness.upstream)
        .await;

    let response = harness
        .server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .json(&test_data::chat_request())
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>(), json!({"error": "overloaded"}));
}

#[tokio::test]
async fn test_upstream_timeout_returns_504_once() {
    let timeout = Duration::from_millis(500);
    let harness = TestHarness::with_settings(TestSettings {
        timeout,
        ..TestSettings::default()
    })
    .await;
    upstream_mocks::mock_hanging_completion(&harness.upstream, Duration::from_secs(5), 1).await;

    let started = Instant::now();
    let response = harness
        .server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .json(&test_data::chat_request())
        .await;
    let elapsed = started.elapsed();

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        response.json::<Value>(),
        json!({
            "status": "error",
            "message": "Request to upstream API timed out after 500ms"
        })
    );
    assert!(elapsed >= timeout, "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "returned after {:?}", elapsed);
}

#[tokio::test]
async fn test_unreachable_upstream_returns_500() {
    // Nothing listens on port 1
    let url = format!("http://127.0.0.1:1{}", constants::UPSTREAM_PATH);
    let state = Arc::new(build_state(&url, &TestSettings::default()));
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    let response = server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .json(&test_data::chat_request())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    let message = body["message"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(!message.contains(constants::TEST_UPSTREAM_KEY));
}

#[tokio::test]
async fn test_invalid_json_is_not_forwarded() {
    let harness = TestHarness::new().await;
    upstream_mocks::mock_never_called(&harness.upstream).await;

    let response = harness
        .server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .text("{\"model\": ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_non_object_json_is_not_forwarded() {
    let harness = TestHarness::new().await;
    upstream_mocks::mock_never_called(&harness.upstream).await;

    let response = harness
        .server
        .post("/api/openai")
        .add_header(token_header(), valid_token())
        .json(&json!(["gpt-4o-mini"]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "error", "message": "Bad request: Request body must be a JSON object"})
    );
}

#[tokio::test]
async fn test_relay_rejects_get() {
    let harness = TestHarness::new().await;
    upstream_mocks::mock_never_called(&harness.upstream).await;

    let response = harness
        .server
        .get("/api/openai")
        .add_header(token_header(), valid_token())
        .await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
