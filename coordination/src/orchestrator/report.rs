//! Report shapes returned by the three entry modes, and the pure
//! aggregation that fills their summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::compliance::validator::round1;
use crate::compliance::{Grade, ValidationResult};
use crate::journey::JourneyResult;
use crate::plan::TestPlan;
use crate::probe::{TestResult, TestStatus};

/// Suggestions surfaced in the compliance summary.
const TOP_SUGGESTIONS: usize = 5;

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 / whole as f64 * 100.0)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        round1(sum / n as f64)
    }
}

// ── Test runner ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Percent, one decimal.
    pub pass_rate: f64,
    /// Sum of per-test durations, ms.
    pub total_duration: u64,
}

impl TestRunSummary {
    pub fn of(results: &[TestResult]) -> Self {
        let count = |s: TestStatus| results.iter().filter(|r| r.status == s).count();
        let passed = count(TestStatus::Passed);
        Self {
            total: results.len(),
            passed,
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Skipped),
            pass_rate: percent(passed, results.len()),
            total_duration: results.iter().map(|r| r.duration_ms).sum(),
        }
    }
}

/// A plan together with the feature it was generated for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub feature: String,
    /// Model id, or `"fallback"`.
    pub source: String,
    #[serde(flatten)]
    pub plan: TestPlan,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunReport {
    pub success: bool,
    pub feature: String,
    pub summary: TestRunSummary,
    pub plans: Vec<PlanEntry>,
    pub analysis: String,
    pub model_used: String,
    pub results: Vec<TestResult>,
    pub run_id: Option<Uuid>,
    pub executed_at: DateTime<Utc>,
}

// ── UX tester ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UxSummary {
    pub total_journeys: usize,
    pub avg_ux_score: f64,
    /// Percent of successful journeys.
    pub overall_success_rate: f64,
    pub personas_tested: usize,
    pub journeys_tested: usize,
    /// Mean latency of API-bound steps, ms.
    pub avg_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaStats {
    pub name: String,
    pub journeys: usize,
    pub avg_ux_score: f64,
    /// Percent.
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStats {
    pub name: String,
    pub runs: usize,
    pub avg_ux_score: f64,
    /// Percent.
    pub avg_completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UxReport {
    pub success: bool,
    pub summary: UxSummary,
    pub by_persona: BTreeMap<String, PersonaStats>,
    pub by_journey: BTreeMap<String, JourneyStats>,
    pub results: Vec<JourneyResult>,
    pub analysis: String,
    pub model_used: String,
    pub run_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

/// Summary plus per-persona and per-journey breakdowns.
pub fn aggregate_journeys(
    results: &[JourneyResult],
) -> (
    UxSummary,
    BTreeMap<String, PersonaStats>,
    BTreeMap<String, JourneyStats>,
) {
    let mut personas: BTreeMap<&str, Vec<&JourneyResult>> = BTreeMap::new();
    let mut journeys: BTreeMap<&str, Vec<&JourneyResult>> = BTreeMap::new();
    for r in results {
        personas.entry(&r.persona_id).or_default().push(r);
        journeys.entry(&r.journey_id).or_default().push(r);
    }

    let by_persona = personas
        .iter()
        .map(|(id, runs)| {
            let ok = runs.iter().filter(|r| r.is_success()).count();
            (
                id.to_string(),
                PersonaStats {
                    name: runs[0].persona.clone(),
                    journeys: runs.len(),
                    avg_ux_score: mean(runs.iter().map(|r| r.ux_score as f64)),
                    success_rate: percent(ok, runs.len()),
                },
            )
        })
        .collect();

    let by_journey = journeys
        .iter()
        .map(|(id, runs)| {
            (
                id.to_string(),
                JourneyStats {
                    name: runs[0].journey.clone(),
                    runs: runs.len(),
                    avg_ux_score: mean(runs.iter().map(|r| r.ux_score as f64)),
                    avg_completion_rate: mean(runs.iter().map(|r| r.completion_rate * 100.0)),
                },
            )
        })
        .collect();

    let successes = results.iter().filter(|r| r.is_success()).count();
    let summary = UxSummary {
        total_journeys: results.len(),
        avg_ux_score: mean(results.iter().map(|r| r.ux_score as f64)),
        overall_success_rate: percent(successes, results.len()),
        personas_tested: personas.len(),
        journeys_tested: journeys.len(),
        avg_response_time: mean(
            results
                .iter()
                .flat_map(|r| r.steps.iter())
                .filter(|s| s.endpoint.is_some())
                .map(|s| s.duration_ms as f64),
        ),
    };

    (summary, by_persona, by_journey)
}

// ── Compliance validator ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub overall_accuracy: f64,
    pub calculators_validated: usize,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub standards_compliance: BTreeMap<String, bool>,
    pub overall_grade: Grade,
    pub top_suggestions: Vec<String>,
}

impl ComplianceSummary {
    pub fn of(results: &[ValidationResult]) -> Self {
        let overall_accuracy = mean(results.iter().map(|r| r.overall_accuracy));

        let mut standards_compliance: BTreeMap<String, bool> = BTreeMap::new();
        for r in results {
            for (standard, ok) in &r.standards_compliance {
                let entry = standards_compliance.entry(standard.clone()).or_insert(true);
                *entry = *entry && *ok;
            }
        }

        let mut top_suggestions: Vec<String> = Vec::new();
        for s in results.iter().flat_map(|r| r.suggestions.iter()) {
            if top_suggestions.len() == TOP_SUGGESTIONS {
                break;
            }
            if !top_suggestions.contains(s) {
                top_suggestions.push(s.clone());
            }
        }

        Self {
            overall_accuracy,
            calculators_validated: results.len(),
            total_issues: results.iter().map(|r| r.issues.len()).sum(),
            critical_issues: results.iter().map(|r| r.critical_failures()).sum(),
            standards_compliance,
            overall_grade: Grade::from_accuracy(overall_accuracy),
            top_suggestions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub success: bool,
    pub summary: ComplianceSummary,
    pub results: Vec<ValidationResult>,
    pub unknown_calculators: Vec<String>,
    pub run_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}
