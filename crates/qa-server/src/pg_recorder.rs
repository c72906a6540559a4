//! Postgres-backed run recorder.
//!
//! Insert-only: one `test_runs` row per run, then its `test_results` and
//! `stress_test_metrics` children. Rows are never updated.

use async_trait::async_trait;
use qa_coordination::{RecorderError, RunRecord, RunRecorder, StressMetric, TestResult};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;
use uuid::Uuid;

/// Tables written by the recorder.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS test_runs (
    id UUID PRIMARY KEY,
    run_name TEXT NOT NULL,
    total_tests INTEGER NOT NULL,
    passed_tests INTEGER NOT NULL,
    failed_tests INTEGER NOT NULL,
    skipped_tests INTEGER NOT NULL,
    duration_ms BIGINT NOT NULL,
    environment TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS test_results (
    id BIGSERIAL PRIMARY KEY,
    run_id UUID NOT NULL REFERENCES test_runs(id),
    test_name TEXT NOT NULL,
    test_category TEXT NOT NULL,
    status TEXT NOT NULL,
    duration_ms BIGINT NOT NULL,
    error_message TEXT,
    details JSONB
);
CREATE TABLE IF NOT EXISTS stress_test_metrics (
    id BIGSERIAL PRIMARY KEY,
    run_id UUID NOT NULL REFERENCES test_runs(id),
    endpoint TEXT NOT NULL,
    persona_id TEXT NOT NULL,
    journey_id TEXT NOT NULL,
    response_time_ms BIGINT NOT NULL,
    success BOOLEAN NOT NULL,
    error_message TEXT,
    recorded_at TIMESTAMPTZ NOT NULL
);
";

const INSERT_RUN: &str = "INSERT INTO test_runs \
    (id, run_name, total_tests, passed_tests, failed_tests, skipped_tests, duration_ms, environment, created_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";

const INSERT_RESULT: &str = "INSERT INTO test_results \
    (run_id, test_name, test_category, status, duration_ms, error_message, details) \
    VALUES ($1, $2, $3, $4, $5, $6, $7)";

const INSERT_METRIC: &str = "INSERT INTO stress_test_metrics \
    (run_id, endpoint, persona_id, journey_id, response_time_ms, success, error_message, recorded_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

fn insert_error(table: &'static str) -> impl Fn(sqlx::Error) -> RecorderError {
    move |e| RecorderError::Insert {
        table,
        message: e.to_string(),
    }
}

pub struct PostgresRecorder {
    pool: PgPool,
}

impl PostgresRecorder {
    pub async fn connect(url: &str) -> Result<Self, RecorderError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| RecorderError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Create the recorder's tables if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), RecorderError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RecorderError::Connection(e.to_string()))
    }
}

#[async_trait]
impl RunRecorder for PostgresRecorder {
    async fn record_run(&self, run: &RunRecord, results: &[TestResult]) -> Result<(), RecorderError> {
        let mut tx = self.pool.begin().await.map_err(insert_error("test_runs"))?;

        sqlx::query(INSERT_RUN)
            .bind(run.id)
            .bind(&run.run_name)
            .bind(run.total_tests as i32)
            .bind(run.passed_tests as i32)
            .bind(run.failed_tests as i32)
            .bind(run.skipped_tests as i32)
            .bind(run.duration_ms as i64)
            .bind(&run.environment)
            .bind(run.created_at)
            .execute(&mut *tx)
            .await
            .map_err(insert_error("test_runs"))?;

        for result in results {
            sqlx::query(INSERT_RESULT)
                .bind(run.id)
                .bind(&result.name)
                .bind(&result.category)
                .bind(result.status.to_string())
                .bind(result.duration_ms as i64)
                .bind(&result.error_message)
                .bind(&result.details)
                .execute(&mut *tx)
                .await
                .map_err(insert_error("test_results"))?;
        }

        tx.commit().await.map_err(insert_error("test_results"))?;
        debug!(run_id = %run.id, results = results.len(), "run recorded");
        Ok(())
    }

    async fn record_metrics(&self, run_id: Uuid, metrics: &[StressMetric]) -> Result<(), RecorderError> {
        if metrics.is_empty() {
            return Ok(());
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(insert_error("stress_test_metrics"))?;
        for metric in metrics {
            sqlx::query(INSERT_METRIC)
                .bind(run_id)
                .bind(&metric.endpoint)
                .bind(&metric.persona_id)
                .bind(&metric.journey_id)
                .bind(metric.response_time_ms as i64)
                .bind(metric.success)
                .bind(&metric.error_message)
                .bind(metric.recorded_at)
                .execute(&mut *tx)
                .await
                .map_err(insert_error("stress_test_metrics"))?;
        }
        tx.commit()
            .await
            .map_err(insert_error("stress_test_metrics"))?;
        debug!(%run_id, metrics = metrics.len(), "stress metrics recorded");
        Ok(())
    }
}
