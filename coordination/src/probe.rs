//! Probe Client: JSON POST calls against named service endpoints
//!
//! Every call is timed from just before the request is sent until the body
//! has been read (or the call failed), and the raw outcome is normalised
//! into a [`TestResult`]. Probes never retry and never panic; failures are
//! data.
//!
//! # Classification
//!
//! ```text
//! send ──┬─ transport error ────────────────→ failed (error text)
//!        ├─ non-2xx ────────────────────────→ failed ("HTTP <code>: <body>")
//!        ├─ 2xx, body not JSON ─────────────→ failed (parse error)
//!        ├─ 2xx, body has truthy `error` ───→ failed (body.error)
//!        └─ 2xx, clean JSON body ───────────→ passed
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors produced by a single probe or direct endpoint invocation.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("{0}")]
    Request(String),

    /// Endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Endpoint answered 2xx but reported an error in the body.
    #[error("{0}")]
    Upstream(String),

    /// Response body was not valid JSON.
    #[error("Invalid JSON response: {0}")]
    Parse(String),

    /// Calculation endpoint flagged the result as `crashed`.
    #[error("Calculation crashed")]
    Crashed,
}

/// Outcome status of one test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// One line-item of a test run. Never mutated once appended to a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub category: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error_message: Option<String>,
    pub details: Option<Value>,
}

impl TestResult {
    pub fn passed(
        name: impl Into<String>,
        category: impl Into<String>,
        duration_ms: u64,
        details: Value,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            status: TestStatus::Passed,
            duration_ms,
            error_message: None,
            details: Some(details),
        }
    }

    pub fn failed(
        name: impl Into<String>,
        category: impl Into<String>,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            status: TestStatus::Failed,
            duration_ms,
            error_message: Some(error.into()),
            details: None,
        }
    }

    pub fn skipped(
        name: impl Into<String>,
        category: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            status: TestStatus::Skipped,
            duration_ms: 0,
            error_message: Some(reason.into()),
            details: None,
        }
    }

    /// Re-label a result produced by [`ProbeClient::probe`].
    pub fn labelled(mut self, name: impl Into<String>, category: impl Into<String>) -> Self {
        self.name = name.into();
        self.category = category.into();
        self
    }

    pub fn is_passed(&self) -> bool {
        self.status == TestStatus::Passed
    }

    pub fn is_failed(&self) -> bool {
        self.status == TestStatus::Failed
    }
}

/// Where and how probes are sent.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Base URL; endpoint `name` resolves to `{base_url}/{name}`.
    pub base_url: String,
    /// Optional bearer token attached to every request.
    pub service_key: Option<String>,
    /// Upper bound for one call, including body read.
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:54321/functions/v1".to_string(),
            service_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// An HTTP response read to completion.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }

    pub fn json(&self) -> Result<Value, ProbeError> {
        serde_json::from_str(&self.body).map_err(|e| ProbeError::Parse(e.to_string()))
    }

    /// Body rendered as a JSON string, for error messages.
    pub fn body_as_json_string(&self) -> String {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(v) => v.to_string(),
            Err(_) => Value::String(self.body.clone()).to_string(),
        }
    }

    pub fn status_error(&self) -> ProbeError {
        ProbeError::Http {
            status: self.status,
            body: self.body_as_json_string(),
        }
    }
}

/// Timed result of one outbound call.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub endpoint: String,
    pub duration: Duration,
    pub response: Result<RawResponse, ProbeError>,
}

impl ProbeOutcome {
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// Classify into a [`TestResult`] named after the endpoint.
    pub fn into_test_result(self, input: &Value) -> TestResult {
        let duration_ms = self.duration_ms();
        let name = self.endpoint;

        let raw = match self.response {
            Ok(raw) => raw,
            Err(e) => return TestResult::failed(name, "probe", duration_ms, e.to_string()),
        };

        if !raw.is_success() {
            return TestResult::failed(name, "probe", duration_ms, raw.status_error().to_string());
        }

        match raw.json() {
            Err(e) => TestResult::failed(name, "probe", duration_ms, e.to_string()),
            Ok(body) => match error_field(&body) {
                Some(err) => TestResult::failed(name, "probe", duration_ms, err),
                None => TestResult::passed(
                    name,
                    "probe",
                    duration_ms,
                    serde_json::json!({ "input": input, "hasResponse": true }),
                ),
            },
        }
    }
}

/// Returns the body-level `error` field when it is truthy.
pub fn error_field(body: &Value) -> Option<String> {
    let err = body.get("error")?;
    if !is_truthy(err) {
        return None;
    }
    Some(match err {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string()),
        other => other.to_string(),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// HTTP client for named endpoints.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    http: reqwest::Client,
    config: ProbeConfig,
}

impl ProbeClient {
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Send `input` to `endpoint` and capture whatever comes back.
    pub async fn send(&self, endpoint: &str, input: &Value) -> ProbeOutcome {
        let start = Instant::now();

        let mut request = self.http.post(self.url_for(endpoint)).json(input);
        if let Some(key) = &self.config.service_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = match request.send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let content_type = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                resp.text()
                    .await
                    .map(|body| RawResponse {
                        status,
                        content_type,
                        body,
                    })
                    .map_err(|e| ProbeError::Request(e.to_string()))
            }
            Err(e) => Err(ProbeError::Request(e.to_string())),
        };

        let duration = start.elapsed();
        debug!(
            endpoint,
            status = ?response.as_ref().map(|r| r.status).ok(),
            duration_ms = duration.as_millis() as u64,
            "probe completed"
        );

        ProbeOutcome {
            endpoint: endpoint.to_string(),
            duration,
            response,
        }
    }

    /// Probe an endpoint and classify the outcome.
    pub async fn probe(&self, endpoint: &str, input: &Value) -> TestResult {
        self.send(endpoint, input).await.into_test_result(input)
    }

    /// Call an endpoint directly and return its JSON body.
    ///
    /// Used where the caller needs the outputs rather than a line-item.
    pub async fn invoke(&self, endpoint: &str, input: &Value) -> Result<Value, ProbeError> {
        let raw = self.send(endpoint, input).await.response?;
        if !raw.is_success() {
            return Err(raw.status_error());
        }
        let body = raw.json()?;
        if let Some(err) = error_field(&body) {
            return Err(ProbeError::Upstream(err));
        }
        if is_crashed(&body) {
            return Err(ProbeError::Crashed);
        }
        Ok(body)
    }
}

/// Calculators flag a crash either on the body or inside its `results`.
fn is_crashed(body: &Value) -> bool {
    let flagged = |v: &Value| v.get("crashed").and_then(Value::as_bool).unwrap_or(false);
    flagged(body) || body.get("results").is_some_and(flagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(status: u16, body: &str) -> ProbeOutcome {
        ProbeOutcome {
            endpoint: "calculate-beam".into(),
            duration: Duration::from_millis(12),
            response: Ok(RawResponse {
                status,
                content_type: Some("application/json".into()),
                body: body.into(),
            }),
        }
    }

    #[test]
    fn test_clean_body_passes() {
        let input = json!({"span": 6});
        let r = outcome(200, r#"{"maxMoment": 153}"#).into_test_result(&input);
        assert_eq!(r.status, TestStatus::Passed);
        assert!(r.error_message.is_none());
        assert_eq!(r.duration_ms, 12);
        let details = r.details.unwrap();
        assert_eq!(details["hasResponse"], json!(true));
        assert_eq!(details["input"], input);
    }

    #[test]
    fn test_non_2xx_formats_http_code_and_body() {
        let r = outcome(422, r#"{"error":"span required"}"#).into_test_result(&json!({}));
        assert_eq!(r.status, TestStatus::Failed);
        assert_eq!(
            r.error_message.as_deref(),
            Some(r#"HTTP 422: {"error":"span required"}"#)
        );
    }

    #[test]
    fn test_non_json_error_body_is_quoted() {
        let r = outcome(502, "Bad Gateway").into_test_result(&json!({}));
        assert_eq!(r.error_message.as_deref(), Some(r#"HTTP 502: "Bad Gateway""#));
    }

    #[test]
    fn test_error_field_on_2xx_fails() {
        let r = outcome(200, r#"{"error":"division by zero"}"#).into_test_result(&json!({}));
        assert_eq!(r.status, TestStatus::Failed);
        assert_eq!(r.error_message.as_deref(), Some("division by zero"));
    }

    #[test]
    fn test_falsy_error_field_passes() {
        for body in [
            r#"{"error":null}"#,
            r#"{"error":false}"#,
            r#"{"error":""}"#,
            r#"{"error":0}"#,
        ] {
            let r = outcome(200, body).into_test_result(&json!({}));
            assert_eq!(r.status, TestStatus::Passed, "body {body}");
        }
    }

    #[test]
    fn test_unparseable_body_fails_with_message() {
        let r = outcome(200, "<html>").into_test_result(&json!({}));
        assert_eq!(r.status, TestStatus::Failed);
        assert!(r.error_message.unwrap().starts_with("Invalid JSON response"));
    }

    #[test]
    fn test_transport_error_keeps_duration() {
        let o = ProbeOutcome {
            endpoint: "ai-chat".into(),
            duration: Duration::from_millis(40),
            response: Err(ProbeError::Request("connection refused".into())),
        };
        let r = o.into_test_result(&json!({}));
        assert_eq!(r.status, TestStatus::Failed);
        assert_eq!(r.duration_ms, 40);
        assert_eq!(r.error_message.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_error_object_uses_message() {
        let body = json!({"error": {"message": "quota exceeded", "code": 429}});
        assert_eq!(error_field(&body).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_url_for_joins_cleanly() {
        let client = ProbeClient::new(ProbeConfig {
            base_url: "http://localhost:9000/functions/v1/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.url_for("/calculate-beam"),
            "http://localhost:9000/functions/v1/calculate-beam"
        );
    }

    #[test]
    fn test_content_type_detection() {
        let mut raw = RawResponse {
            status: 200,
            content_type: Some("application/json; charset=utf-8".into()),
            body: "{}".into(),
        };
        assert!(raw.is_json());
        raw.content_type = Some("text/html".into());
        assert!(!raw.is_json());
        raw.content_type = None;
        assert!(!raw.is_json());
    }
}
