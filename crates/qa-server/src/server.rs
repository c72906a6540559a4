//! HTTP surface: the three entry endpoints plus health.
//!
//! Endpoints:
//! - POST /ai-test-runner            - Feature test batteries (Endpoint A)
//! - POST /ai-ux-tester              - Persona journey simulation (Endpoint B)
//! - POST /engineering-ai-validator  - Calculator compliance validation (Endpoint C)
//! - GET  /health                    - Liveness
//!
//! Every response is JSON. Bodies are parsed here rather than by an axum
//! extractor so malformed JSON and oversized bodies produce the
//! `{success:false, error}` envelope instead of a plain-text rejection.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use qa_coordination::{ComplianceRequest, Orchestrator, RunRequest, TestRunRequest, UxRequest};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Maximum request body size: 1 MB.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Failures in the request path itself.
///
/// Body read failures keep axum's status (413 for oversized bodies); the
/// rest are reported with status 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unreadable request body: {}", .0.body_text())]
    Body(#[from] BytesRejection),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Run aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Body(rejection) => rejection.status(),
            Self::InvalidBody(_) | Self::Aborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            self.status(),
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/ai-test-runner", post(handle_test_runner).options(handle_preflight))
        .route("/ai-ux-tester", post(handle_ux_tester).options(handle_preflight))
        .route(
            "/engineering-ai-validator",
            post(handle_validator).options(handle_preflight),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(orchestrator)
}

/// Serve until Ctrl+C.
pub async fn serve(orchestrator: Arc<Orchestrator>, bind: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "qa-server listening");
    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("qa-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Empty or whitespace-only bodies count as `{}`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice(b"{}")
    } else {
        serde_json::from_slice(body)
    }
}

/// Run the orchestrator on its own task so a panic becomes an error response.
async fn dispatch(orchestrator: Arc<Orchestrator>, request: RunRequest) -> Result<Response, ApiError> {
    let report = tokio::spawn(async move { orchestrator.run(request).await }).await?;
    Ok(Json(report).into_response())
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn handle_preflight() -> StatusCode {
    StatusCode::OK
}

async fn handle_test_runner(
    State(orchestrator): State<Arc<Orchestrator>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let request: TestRunRequest = parse_body(&body?)?;
    dispatch(orchestrator, RunRequest::Tests(request)).await
}

async fn handle_ux_tester(
    State(orchestrator): State<Arc<Orchestrator>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let request: UxRequest = parse_body(&body?)?;
    dispatch(orchestrator, RunRequest::Ux(request)).await
}

async fn handle_validator(
    State(orchestrator): State<Arc<Orchestrator>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let request: ComplianceRequest = parse_body(&body?)?;
    dispatch(orchestrator, RunRequest::Compliance(request)).await
}
