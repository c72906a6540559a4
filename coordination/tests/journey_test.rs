//! Journey simulation against mock endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use qa_coordination::journey::{
    Catalog, Journey, JourneySimulator, JourneyStatus, JourneyStep, Patience, StepStatus,
    ABANDONMENT_MESSAGE,
};
use serde_json::json;

async fn mock() -> String {
    let router = Router::new()
        .route("/fast", post(|| async { Json(json!({ "ok": true })) }))
        .route(
            "/down",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "down" }))) }),
        )
        .route("/text", post(|| async { "plain text" }))
        .route(
            "/sluggish",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(80)).await;
                Json(json!({ "ok": true }))
            }),
        );
    common::serve(router).await
}

fn api(action: &str, endpoint: &str, expected_ms: u64, critical: bool) -> JourneyStep {
    JourneyStep {
        action: action.to_string(),
        endpoint: Some(endpoint.to_string()),
        input: Some(json!({})),
        expected_duration_ms: expected_ms,
        critical_for_success: critical,
    }
}

fn ui(action: &str, expected_ms: u64) -> JourneyStep {
    JourneyStep {
        action: action.to_string(),
        endpoint: None,
        input: None,
        expected_duration_ms: expected_ms,
        critical_for_success: false,
    }
}

fn journey(steps: Vec<JourneyStep>) -> Journey {
    Journey {
        id: "test".to_string(),
        name: "Test Journey".to_string(),
        description: String::new(),
        expected_total_time_ms: steps.iter().map(|s| s.expected_duration_ms).sum(),
        steps,
    }
}

#[tokio::test]
async fn test_low_patience_persona_abandons_after_two_critical_failures() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    let catalog = Catalog::builtin();
    let persona = catalog.persona("busy_engineer").unwrap();
    assert_eq!(persona.patience, Patience::Low);

    let j = journey(vec![
        api("First calculation", "down", 3000, true),
        api("Second calculation", "down", 3000, true),
        api("Third calculation", "fast", 3000, true),
        ui("Read result", 2000),
    ]);
    let result = JourneySimulator::new(&probe, common::fast_simulator())
        .simulate(&j, persona)
        .await;

    assert!(result.abandoned);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.frustrations.len(), 3);
    assert!(result.frustrations.iter().any(|f| f == ABANDONMENT_MESSAGE));
    assert_eq!(result.status, JourneyStatus::Failed);
    assert_eq!(result.completion_rate, 0.0);
    assert_eq!(result.critical_success_rate, 0.0);
}

#[tokio::test]
async fn test_patient_persona_keeps_going() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    let catalog = Catalog::builtin();
    let persona = catalog.persona("novice_student").unwrap();

    let j = journey(vec![
        api("First calculation", "down", 3000, true),
        api("Second calculation", "down", 3000, true),
        api("Third calculation", "fast", 3000, true),
    ]);
    let result = JourneySimulator::new(&probe, common::fast_simulator())
        .simulate(&j, persona)
        .await;

    assert!(!result.abandoned);
    assert_eq!(result.steps.len(), 3);
    assert_eq!(result.frustrations.len(), 2);
    assert!((result.completion_rate - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(result.status, JourneyStatus::Failed);
}

#[tokio::test]
async fn test_non_json_step_fails() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    let catalog = Catalog::builtin();
    let persona = catalog.persona("senior_reviewer").unwrap();

    let j = journey(vec![api("Calculate", "text", 3000, true)]);
    let result = JourneySimulator::new(&probe, common::fast_simulator())
        .simulate(&j, persona)
        .await;
    assert_eq!(result.steps[0].status, StepStatus::Failed);
    assert_eq!(result.steps[0].error.as_deref(), Some("Non-JSON response"));
}

#[tokio::test]
async fn test_slow_step_is_frustration_but_counts_as_completed() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    let catalog = Catalog::builtin();
    let persona = catalog.persona("senior_reviewer").unwrap();

    let j = journey(vec![api("Calculate", "sluggish", 10, true)]);
    let result = JourneySimulator::new(&probe, common::fast_simulator())
        .simulate(&j, persona)
        .await;
    assert_eq!(result.steps[0].status, StepStatus::Slow);
    assert_eq!(result.frustrations.len(), 1);
    assert_eq!(result.completion_rate, 1.0);
    assert_eq!(result.critical_success_rate, 1.0);
    assert_eq!(result.status, JourneyStatus::Success);
}

#[tokio::test]
async fn test_fast_journey_scores_highlights() {
    let base = mock().await;
    let probe = common::probe_client(&base);
    let catalog = Catalog::builtin();
    let persona = catalog.persona("site_contractor").unwrap();

    let j = journey(vec![
        ui("Open calculator", 1500),
        api("Calculate", "fast", 3000, true),
        ui("Read result", 2000),
    ]);
    let result = JourneySimulator::new(&probe, common::fast_simulator())
        .simulate(&j, persona)
        .await;

    assert_eq!(result.status, JourneyStatus::Success);
    assert_eq!(result.highlights.len(), 1);
    assert!(result.frustrations.is_empty());
    // 50 + 30 critical + 15 speed + 3 highlight
    assert_eq!(result.ux_score, 98);
    // UI think time is capped
    assert!(result.total_duration_ms < 1000);
}
