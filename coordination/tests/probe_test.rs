//! Probe classification over real HTTP.

mod common;

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use qa_coordination::{ProbeClient, ProbeConfig, ProbeError, TestStatus};
use serde_json::{json, Value};

async fn mock() -> String {
    let router = Router::new()
        .route("/ok", post(|Json(body): Json<Value>| async move { Json(json!({ "echo": body })) }))
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" }))) }),
        )
        .route(
            "/rejects",
            post(|| async { Json(json!({ "error": "span must be positive" })) }),
        )
        .route("/falsy-error", post(|| async { Json(json!({ "error": false, "value": 1 })) }))
        .route("/html", post(|| async { "<html>maintenance</html>" }))
        .route(
            "/crashy",
            post(|| async { Json(json!({ "crashed": true, "results": {} })) }),
        )
        .route(
            "/crashy-results",
            post(|| async { Json(json!({ "results": { "crashed": true, "maxMoment": 0 } })) }),
        )
        .route(
            "/auth",
            post(|headers: HeaderMap| async move {
                let bearer = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let apikey = headers
                    .get("apikey")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "authorization": bearer, "apikey": apikey }))
            }),
        );
    common::serve(router).await
}

#[tokio::test]
async fn test_clean_json_passes() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    let input = json!({ "span": 6 });
    let result = probe.probe("ok", &input).await;
    assert_eq!(result.status, TestStatus::Passed);
    assert!(result.error_message.is_none());
    let details = result.details.unwrap();
    assert_eq!(details["input"], input);
    assert_eq!(details["hasResponse"], true);
}

#[tokio::test]
async fn test_non_2xx_reports_status_and_body() {
    let base = mock().await;
    let result = common::probe_client(&base).probe("broken", &json!({})).await;
    assert_eq!(result.status, TestStatus::Failed);
    assert_eq!(
        result.error_message.as_deref(),
        Some(r#"HTTP 500: {"message":"boom"}"#)
    );
}

#[tokio::test]
async fn test_error_field_fails_despite_200() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    let result = probe.probe("rejects", &json!({})).await;
    assert_eq!(result.status, TestStatus::Failed);
    assert_eq!(result.error_message.as_deref(), Some("span must be positive"));

    let result = probe.probe("falsy-error", &json!({})).await;
    assert_eq!(result.status, TestStatus::Passed);
}

#[tokio::test]
async fn test_unparseable_body_fails() {
    let base = mock().await;
    let result = common::probe_client(&base).probe("html", &json!({})).await;
    assert_eq!(result.status, TestStatus::Failed);
    assert!(result.error_message.unwrap().starts_with("Invalid JSON response"));
}

#[tokio::test]
async fn test_network_failure_is_data() {
    let base = common::dead_base_url().await;
    let result = common::probe_client(&base).probe("ok", &json!({})).await;
    assert_eq!(result.status, TestStatus::Failed);
    assert!(!result.error_message.unwrap().is_empty());
}

#[tokio::test]
async fn test_unmatched_route_is_http_failure() {
    let base = mock().await;
    let result = common::probe_client(&base).probe("missing", &json!({})).await;
    assert_eq!(result.status, TestStatus::Failed);
    assert!(result.error_message.unwrap().starts_with("HTTP 404"));
}

#[tokio::test]
async fn test_invoke_flags_crashed_results() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    assert!(matches!(
        probe.invoke("crashy", &json!({})).await,
        Err(ProbeError::Crashed)
    ));
    assert!(matches!(
        probe.invoke("crashy-results", &json!({})).await,
        Err(ProbeError::Crashed)
    ));
    assert!(matches!(
        probe.invoke("rejects", &json!({})).await,
        Err(ProbeError::Upstream(_))
    ));
    let body = probe.invoke("ok", &json!({ "a": 1 })).await.unwrap();
    assert_eq!(body["echo"]["a"], 1);
}

#[tokio::test]
async fn test_service_key_is_sent() {
    let base = mock().await;
    let probe = ProbeClient::new(ProbeConfig {
        base_url: format!("{base}/"),
        service_key: Some("secret".to_string()),
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    let body = probe.invoke("auth", &json!({})).await.unwrap();
    assert_eq!(body["authorization"], "Bearer secret");
    assert_eq!(body["apikey"], "secret");
}
