//! Run Recorder: insert-only persistence of runs and their line items.
//!
//! The orchestrator writes exactly one [`RunRecord`] per invocation,
//! followed by its child rows. Recording failures are reported to the
//! caller, which logs them and carries on; they never fail a run.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::probe::{TestResult, TestStatus};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Insert into {table} failed: {message}")]
    Insert { table: &'static str, message: String },
}

/// One row of `test_runs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub run_name: String,
    pub total_tests: u32,
    pub passed_tests: u32,
    pub failed_tests: u32,
    pub skipped_tests: u32,
    pub duration_ms: u64,
    pub environment: String,
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    /// Summarise `results` into a fresh run row.
    pub fn from_results(
        run_name: impl Into<String>,
        environment: impl Into<String>,
        results: &[TestResult],
        duration_ms: u64,
    ) -> Self {
        let count = |s: TestStatus| results.iter().filter(|r| r.status == s).count() as u32;
        Self {
            id: Uuid::new_v4(),
            run_name: run_name.into(),
            total_tests: results.len() as u32,
            passed_tests: count(TestStatus::Passed),
            failed_tests: count(TestStatus::Failed),
            skipped_tests: count(TestStatus::Skipped),
            duration_ms,
            environment: environment.into(),
            created_at: Utc::now(),
        }
    }
}

/// One row of `stress_test_metrics`: a single API-bound journey step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressMetric {
    pub endpoint: String,
    pub persona_id: String,
    pub journey_id: String,
    pub response_time_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[async_trait]
pub trait RunRecorder: Send + Sync {
    /// Insert the run row, then one row per result.
    async fn record_run(&self, run: &RunRecord, results: &[TestResult]) -> Result<(), RecorderError>;

    /// Insert stress metrics belonging to an already recorded run.
    async fn record_metrics(&self, run_id: Uuid, metrics: &[StressMetric]) -> Result<(), RecorderError>;
}

/// A recorded run with its child rows.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub run: RunRecord,
    pub results: Vec<TestResult>,
    pub metrics: Vec<StressMetric>,
}

/// In-process recorder keeping the most recent runs.
///
/// Used when no database is configured, and by tests.
pub struct MemoryRecorder {
    capacity: usize,
    runs: Mutex<VecDeque<StoredRun>>,
}

impl Default for MemoryRecorder {
    fn default() -> Self {
        Self::with_capacity(100)
    }
}

impl MemoryRecorder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            runs: Mutex::new(VecDeque::new()),
        }
    }

    /// Snapshot of stored runs, oldest first.
    pub fn runs(&self) -> Vec<StoredRun> {
        let runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.iter().cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> Option<StoredRun> {
        let runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.iter().find(|r| r.run.id == id).cloned()
    }
}

#[async_trait]
impl RunRecorder for MemoryRecorder {
    async fn record_run(&self, run: &RunRecord, results: &[TestResult]) -> Result<(), RecorderError> {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        if runs.len() == self.capacity {
            runs.pop_front();
        }
        runs.push_back(StoredRun {
            run: run.clone(),
            results: results.to_vec(),
            metrics: Vec::new(),
        });
        Ok(())
    }

    async fn record_metrics(&self, run_id: Uuid, metrics: &[StressMetric]) -> Result<(), RecorderError> {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        let stored = runs
            .iter_mut()
            .find(|r| r.run.id == run_id)
            .ok_or_else(|| RecorderError::Insert {
                table: "stress_test_metrics",
                message: format!("unknown run {run_id}"),
            })?;
        stored.metrics.extend_from_slice(metrics);
        Ok(())
    }
}
