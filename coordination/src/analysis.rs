//! Result aggregation and natural-language analysis.
//!
//! Statistics are always computed locally. The AI summary is an
//! enrichment: when the gateway is missing or fails, a deterministic
//! summary built from the same statistics is returned instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::journey::{JourneyResult, JourneyStatus};
use crate::llm::{ChatMessage, LanguageModel, LlmError, ModelChoice};
use crate::probe::{TestResult, TestStatus};
use crate::prompts::{ANALYST_PREAMBLE, MAX_FAILURES_IN_PROMPT, PROMPT_VERSION};
use crate::resilience::{resilient_call, DegradedResponse};

/// Results an analysis is computed over.
#[derive(Debug, Clone, Copy)]
pub enum AnalysisSubject<'a> {
    Tests(&'a [TestResult]),
    Journeys(&'a [JourneyResult]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub analysis: String,
    pub model_used: String,
}

/// Counts and the first few failing items of a subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Skipped tests or partial journeys.
    pub other: usize,
    /// Pass rate (tests) or mean UX score (journeys), 0-100.
    pub score: f64,
    pub failures: Vec<String>,
}

impl Statistics {
    pub fn of(subject: AnalysisSubject<'_>) -> Self {
        match subject {
            AnalysisSubject::Tests(results) => {
                let passed = results.iter().filter(|r| r.status == TestStatus::Passed).count();
                let failed = results.iter().filter(|r| r.status == TestStatus::Failed).count();
                let score = if results.is_empty() {
                    0.0
                } else {
                    passed as f64 / results.len() as f64 * 100.0
                };
                Self {
                    total: results.len(),
                    passed,
                    failed,
                    other: results.len() - passed - failed,
                    score,
                    failures: results
                        .iter()
                        .filter(|r| r.is_failed())
                        .take(MAX_FAILURES_IN_PROMPT)
                        .map(|r| {
                            format!(
                                "{} ({}): {}",
                                r.name,
                                r.category,
                                r.error_message.as_deref().unwrap_or("no message")
                            )
                        })
                        .collect(),
                }
            }
            AnalysisSubject::Journeys(results) => {
                let count = |s: JourneyStatus| results.iter().filter(|r| r.status == s).count();
                let score = if results.is_empty() {
                    0.0
                } else {
                    results.iter().map(|r| r.ux_score as f64).sum::<f64>() / results.len() as f64
                };
                Self {
                    total: results.len(),
                    passed: count(JourneyStatus::Success),
                    failed: count(JourneyStatus::Failed),
                    other: count(JourneyStatus::Partial),
                    score,
                    failures: results
                        .iter()
                        .filter(|r| r.status != JourneyStatus::Success)
                        .take(MAX_FAILURES_IN_PROMPT)
                        .map(|r| format!("{}: {}", r.label(), r.frustrations.join("; ")))
                        .collect(),
                }
            }
        }
    }
}

fn prompt(subject: AnalysisSubject<'_>, stats: &Statistics) -> String {
    let mut out = match subject {
        AnalysisSubject::Tests(_) => format!(
            "Automated API test run: {} tests, {} passed, {} failed, {} skipped. \
             Pass rate {:.1}%.\n",
            stats.total, stats.passed, stats.failed, stats.other, stats.score
        ),
        AnalysisSubject::Journeys(_) => format!(
            "Simulated user journeys: {} runs, {} successful, {} partial, {} failed. \
             Average UX score {:.1}/100.\n",
            stats.total, stats.passed, stats.other, stats.failed, stats.score
        ),
    };
    if !stats.failures.is_empty() {
        out.push_str("\nFailures:\n");
        for f in &stats.failures {
            out.push_str(&format!("- {f}\n"));
        }
    }
    out
}

/// Deterministic summary used when no AI analysis is available.
pub fn fallback_summary(subject: AnalysisSubject<'_>, stats: &Statistics) -> String {
    if stats.total == 0 {
        return match subject {
            AnalysisSubject::Tests(_) => "No tests were executed.".to_string(),
            AnalysisSubject::Journeys(_) => "No journeys were simulated.".to_string(),
        };
    }

    let mut out = match subject {
        AnalysisSubject::Tests(_) => format!(
            "{} of {} tests passed ({:.1}%); {} failed, {} skipped.",
            stats.passed, stats.total, stats.score, stats.failed, stats.other
        ),
        AnalysisSubject::Journeys(_) => format!(
            "{} of {} journeys succeeded; {} partial, {} failed. Average UX score {:.1}/100.",
            stats.passed, stats.total, stats.other, stats.failed, stats.score
        ),
    };
    if stats.failures.is_empty() {
        out.push_str(" No failures to investigate.");
    } else {
        out.push_str(" Investigate: ");
        out.push_str(&stats.failures.join(" | "));
    }
    out
}

/// Summarises results, via the AI gateway when one is configured.
#[derive(Clone, Default)]
pub struct Analyzer {
    model: Option<Arc<dyn LanguageModel>>,
}

impl Analyzer {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    pub async fn analyze(&self, subject: AnalysisSubject<'_>, choice: ModelChoice) -> Analysis {
        let stats = Statistics::of(subject);
        let fallback = || fallback_summary(subject, &stats);

        let response: DegradedResponse<String> = match &self.model {
            Some(model) => {
                let messages = [
                    ChatMessage::system(ANALYST_PREAMBLE),
                    ChatMessage::user(prompt(subject, &stats)),
                ];
                resilient_call(
                    "analysis",
                    choice.model_id(),
                    model.complete(choice.model_id(), &messages),
                    fallback,
                )
                .await
            }
            None => DegradedResponse::fallback(
                fallback(),
                &format!("analysis: {}", LlmError::NotConfigured),
            ),
        };

        info!(
            source = %response.served_by,
            degraded = response.is_degraded(),
            prompt_version = PROMPT_VERSION,
            "analysis ready"
        );
        Analysis {
            model_used: response.served_by.clone(),
            analysis: response.into_payload(),
        }
    }

    /// Statistics-only analysis, for callers that opted out of AI.
    pub fn summarize(&self, subject: AnalysisSubject<'_>) -> Analysis {
        let stats = Statistics::of(subject);
        Analysis {
            analysis: fallback_summary(subject, &stats),
            model_used: crate::resilience::FALLBACK_SOURCE.to_string(),
        }
    }
}
