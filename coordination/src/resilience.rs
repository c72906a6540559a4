//! Resilience: AI-call-with-fallback
//!
//! AI planning and analysis are optional enrichments. Instead of surfacing
//! errors, every AI-backed operation is wrapped in [`resilient_call`], which
//! returns a [`DegradedResponse`] carrying either the primary payload or a
//! deterministic fallback.
//!
//! # Design
//!
//! ```text
//! AI call
//!   ├─ Primary succeeds → DegradedResponse { level: Full, served_by: <model> }
//!   └─ Primary fails    → DegradedResponse { level: Fallback, served_by: "fallback", warnings }
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use qa_coordination::resilience::resilient_call;
//!
//! let plan = resilient_call("plan", model_id, request_plan(), || TestPlan::fallback(&feature)).await;
//! if plan.is_degraded() { /* still usable */ }
//! ```

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier reported as `served_by` when the fallback produced the payload.
pub const FALLBACK_SOURCE: &str = "fallback";

/// Whether a payload came from the primary source or its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationLevel {
    /// Primary (AI) source produced the payload.
    Full,
    /// Deterministic fallback produced the payload.
    Fallback,
}

impl std::fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A payload wrapped with degradation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradedResponse<T> {
    /// The actual payload; always usable.
    pub payload: T,
    pub level: DegradationLevel,
    /// Which source produced the payload (model id or `"fallback"`).
    pub served_by: String,
    /// Why the primary source was not used.
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> DegradedResponse<T> {
    pub fn full(payload: T, served_by: &str) -> Self {
        Self {
            payload,
            level: DegradationLevel::Full,
            served_by: served_by.to_string(),
            warnings: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn fallback(payload: T, warning: &str) -> Self {
        Self {
            payload,
            level: DegradationLevel::Fallback,
            served_by: FALLBACK_SOURCE.to_string(),
            warnings: vec![warning.to_string()],
            timestamp: Utc::now(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.level != DegradationLevel::Full
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

/// Await `primary`; on error, log and substitute `fallback()`.
///
/// This is the single place where the "never throw, always degrade"
/// contract for AI-backed operations is enforced.
pub async fn resilient_call<T, E, Fut, F>(
    operation: &str,
    served_by: &str,
    primary: Fut,
    fallback: F,
) -> DegradedResponse<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    F: FnOnce() -> T,
{
    match primary.await {
        Ok(payload) => DegradedResponse::full(payload, served_by),
        Err(e) => {
            warn!(operation, source = served_by, error = %e, "primary failed, using fallback");
            DegradedResponse::fallback(fallback(), &format!("{operation}: {e}"))
        }
    }
}
