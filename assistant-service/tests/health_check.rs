mod common;

use assistant_service::services::providers::mock::{
    MockAgentProvider, MockCompletionProvider, MockFailure,
};
use common::TestApp;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_failing(failure: MockFailure) -> TestApp {
    TestApp::spawn_with(
        Arc::new(MockCompletionProvider::failing(failure)),
        Arc::new(MockAgentProvider::answering("unused")),
    )
    .await
}

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn_with(
        Arc::new(MockCompletionProvider::new()),
        Arc::new(MockAgentProvider::answering("unused")),
    )
    .await;

    let response = reqwest::get(app.url("/health"))
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "assistant-service");
}

#[tokio::test]
async fn health_check_maps_provider_failures_to_status_codes() {
    let cases = [
        (MockFailure::Authentication, 401),
        (MockFailure::RateLimited, 429),
        (MockFailure::Unavailable, 503),
        (MockFailure::Connection, 503),
        (MockFailure::Api, 500),
    ];

    for (failure, expected) in cases {
        let app = spawn_failing(failure).await;

        let response = reqwest::get(app.url("/health")).await.unwrap();

        assert_eq!(response.status().as_u16(), expected, "{:?}", failure);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "unhealthy");
        assert!(body["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn health_check_probes_openai_models_endpoint() {
    let openai = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openai/models"))
        .and(query_param("api-version", "2024-12-01-preview"))
        .and(header("api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(1)
        .mount(&openai)
        .await;

    let app = TestApp::spawn(&openai.uri(), "http://127.0.0.1:9").await;

    let response = reqwest::get(app.url("/health")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn health_check_reports_rejected_key() {
    let openai = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openai/models"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid subscription key"))
        .mount(&openai)
        .await;

    let app = TestApp::spawn(&openai.uri(), "http://127.0.0.1:9").await;

    let response = reqwest::get(app.url("/health")).await.unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn readiness_and_metrics_are_served() {
    let app = spawn_failing(MockFailure::Api).await;
    let client = reqwest::Client::new();

    let ready = client.get(app.url("/ready")).send().await.unwrap();
    assert_eq!(ready.status().as_u16(), 200);

    let metrics = client.get(app.url("/metrics")).send().await.unwrap();
    assert_eq!(metrics.status().as_u16(), 200);
    let text = metrics.text().await.unwrap();
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = spawn_failing(MockFailure::Api).await;

    let response = reqwest::get(app.url("/nope")).await.unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}
