//! Orchestrator: the three entry modes.
//!
//! ```text
//! TestRunRequest ─→ plan per feature ─→ probe battery ─┐
//! UxRequest ──────→ persona × journey simulation ──────┼─→ analysis ─→ record run ─→ report
//! ComplianceRequest → benchmark validation (concurrent) ┘
//! ```
//!
//! Individual probe, step and fixture failures are data: they land in the
//! report as failed items and never abort a run. Persistence failures are
//! logged and leave `runId` empty.

pub mod report;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{AnalysisSubject, Analyzer};
use crate::benchmark::{hostile_payloads, is_known_endpoint, test_inputs, BenchmarkRegistry, CalculatorKind};
use crate::compliance::{validate_calculator, ValidationResult};
use crate::journey::{Catalog, JourneyResult, JourneySimulator, SimulatorConfig};
use crate::llm::{LanguageModel, ModelChoice};
use crate::plan::{Feature, PlanProvider, TestPlan};
use crate::probe::{error_field, ProbeClient, TestResult};
use crate::recorder::{RunRecord, RunRecorder, StressMetric};
use crate::resilience::DegradedResponse;

pub use report::{
    aggregate_journeys, ComplianceReport, ComplianceSummary, JourneyStats, PersonaStats, PlanEntry,
    TestRunReport, TestRunSummary, UxReport, UxSummary,
};

/// Accuracy a calculator needs to count as passed in the run record.
const COMPLIANCE_PASS_ACCURACY: f64 = 80.0;

fn default_feature() -> String {
    "all".to_string()
}

fn default_true() -> bool {
    true
}

/// Endpoint A request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunRequest {
    #[serde(default = "default_feature")]
    pub feature: String,
    #[serde(default = "default_true", rename = "includeAI", alias = "includeAi")]
    pub include_ai: bool,
    #[serde(default)]
    pub model: ModelChoice,
}

impl Default for TestRunRequest {
    fn default() -> Self {
        Self {
            feature: default_feature(),
            include_ai: true,
            model: ModelChoice::default(),
        }
    }
}

/// Endpoint B request; omitted lists select the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UxRequest {
    #[serde(default)]
    pub personas: Option<Vec<String>>,
    #[serde(default)]
    pub journeys: Option<Vec<String>>,
}

/// Endpoint C request; omitted list validates every calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRequest {
    #[serde(default)]
    pub calculators: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunRequest {
    Tests(TestRunRequest),
    Ux(UxRequest),
    Compliance(ComplianceRequest),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Tests(TestRunReport),
    Ux(UxReport),
    Compliance(ComplianceReport),
}

pub struct Orchestrator {
    probe: ProbeClient,
    recorder: Arc<dyn RunRecorder>,
    planner: PlanProvider,
    analyzer: Analyzer,
    catalog: Catalog,
    registry: BenchmarkRegistry,
    simulator: SimulatorConfig,
    environment: String,
}

impl Orchestrator {
    pub fn new(probe: ProbeClient, recorder: Arc<dyn RunRecorder>) -> Self {
        Self {
            probe,
            recorder,
            planner: PlanProvider::default(),
            analyzer: Analyzer::default(),
            catalog: Catalog::builtin(),
            registry: BenchmarkRegistry::builtin(),
            simulator: SimulatorConfig::default(),
            environment: "development".to_string(),
        }
    }

    /// Enable AI planning and analysis.
    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.planner = PlanProvider::new(Some(model.clone()));
        self.analyzer = Analyzer::new(Some(model));
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_registry(mut self, registry: BenchmarkRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_simulator_config(mut self, config: SimulatorConfig) -> Self {
        self.simulator = config;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn run(&self, request: RunRequest) -> Report {
        match request {
            RunRequest::Tests(req) => Report::Tests(self.run_tests(&req).await),
            RunRequest::Ux(req) => Report::Ux(self.run_ux(&req).await),
            RunRequest::Compliance(req) => Report::Compliance(self.run_compliance(&req).await),
        }
    }

    // ── Endpoint A ────────────────────────────────────────────────────

    pub async fn run_tests(&self, req: &TestRunRequest) -> TestRunReport {
        let start = Instant::now();
        let features = Feature::expand(&req.feature);
        info!(feature = %req.feature, include_ai = req.include_ai, model = %req.model, "test run started");

        let mut plans = Vec::with_capacity(features.len());
        let mut results = Vec::new();
        for feature in &features {
            let plan = if req.include_ai {
                self.planner.generate_plan(feature, req.model).await
            } else {
                DegradedResponse::fallback(TestPlan::fallback(feature), "plan: AI disabled by request")
            };
            results.extend(self.execute_plan(feature, &plan.payload).await);
            plans.push(PlanEntry {
                feature: feature.name().to_string(),
                source: plan.served_by.clone(),
                plan: plan.into_payload(),
            });
        }

        let analysis = if req.include_ai {
            self.analyzer.analyze(AnalysisSubject::Tests(&results), req.model).await
        } else {
            self.analyzer.summarize(AnalysisSubject::Tests(&results))
        };

        let summary = TestRunSummary::of(&results);
        let run = RunRecord::from_results(
            format!("AI Test: {}", req.feature),
            &self.environment,
            &results,
            start.elapsed().as_millis() as u64,
        );
        let run_id = self.persist(&run, &results).await;
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "test run finished"
        );

        TestRunReport {
            success: true,
            feature: req.feature.clone(),
            summary,
            plans,
            analysis: analysis.analysis,
            model_used: analysis.model_used,
            results,
            run_id,
            executed_at: Utc::now(),
        }
    }

    /// Probe every plan endpoint with its registered inputs (or hostile
    /// payloads for the security battery), in plan order.
    async fn execute_plan(&self, feature: &Feature, plan: &TestPlan) -> Vec<TestResult> {
        let mut results = Vec::new();
        for endpoint in &plan.endpoints {
            if !is_known_endpoint(endpoint) {
                warn!(feature = %feature, endpoint = %endpoint, "plan names unknown endpoint");
                results.push(TestResult::skipped(
                    format!("{endpoint} #1"),
                    feature.name(),
                    "Unknown endpoint",
                ));
                continue;
            }

            let cases = match feature {
                Feature::Security => hostile_payloads(endpoint),
                _ => test_inputs(endpoint),
            };
            for (i, input) in cases.iter().enumerate() {
                let result = match feature {
                    Feature::Security => self.security_case(endpoint, input).await,
                    _ => self.probe.probe(endpoint, input).await,
                };
                results.push(result.labelled(format!("{endpoint} #{}", i + 1), feature.name()));
            }
        }
        results
    }

    /// Passes when the endpoint rejects the payload gracefully.
    async fn security_case(&self, endpoint: &str, input: &Value) -> TestResult {
        let outcome = self.probe.send(endpoint, input).await;
        let duration_ms = outcome.duration_ms();
        let raw = match outcome.response {
            Ok(raw) => raw,
            Err(e) => return TestResult::failed(endpoint, "security", duration_ms, e.to_string()),
        };

        if (400..500).contains(&raw.status) {
            return TestResult::passed(
                endpoint,
                "security",
                duration_ms,
                json!({ "input": input, "rejectedWith": raw.status }),
            );
        }
        if !raw.is_success() {
            return TestResult::failed(endpoint, "security", duration_ms, raw.status_error().to_string());
        }
        match raw.json().ok().as_ref().and_then(error_field) {
            Some(reason) => TestResult::passed(
                endpoint,
                "security",
                duration_ms,
                json!({ "input": input, "rejectedWith": reason }),
            ),
            None => TestResult::failed(
                endpoint,
                "security",
                duration_ms,
                format!("Hostile input accepted (HTTP {})", raw.status),
            ),
        }
    }

    // ── Endpoint B ────────────────────────────────────────────────────

    pub async fn run_ux(&self, req: &UxRequest) -> UxReport {
        let start = Instant::now();
        let personas = self.catalog.select_personas(req.personas.as_deref());
        let journeys = self.catalog.select_journeys(req.journeys.as_deref());
        info!(personas = personas.len(), journeys = journeys.len(), "ux run started");

        let simulator = JourneySimulator::new(&self.probe, self.simulator.clone());
        let mut results = Vec::with_capacity(personas.len() * journeys.len());
        for persona in &personas {
            for journey in &journeys {
                results.push(simulator.simulate(journey, persona).await);
            }
        }

        let analysis = self
            .analyzer
            .analyze(AnalysisSubject::Journeys(&results), ModelChoice::default())
            .await;
        let (summary, by_persona, by_journey) = aggregate_journeys(&results);

        let line_items: Vec<TestResult> = results.iter().map(journey_line_item).collect();
        let run = RunRecord::from_results(
            "UX Journey Simulation",
            &self.environment,
            &line_items,
            start.elapsed().as_millis() as u64,
        );
        let run_id = self.persist(&run, &line_items).await;
        if let Some(id) = run_id {
            let metrics = stress_metrics(&results);
            if let Err(e) = self.recorder.record_metrics(id, &metrics).await {
                warn!(run_id = %id, error = %e, "failed to record stress metrics");
            }
        }
        info!(
            journeys = summary.total_journeys,
            avg_ux_score = summary.avg_ux_score,
            "ux run finished"
        );

        UxReport {
            success: true,
            summary,
            by_persona,
            by_journey,
            results,
            analysis: analysis.analysis,
            model_used: analysis.model_used,
            run_id,
            timestamp: Utc::now(),
        }
    }

    // ── Endpoint C ────────────────────────────────────────────────────

    pub async fn run_compliance(&self, req: &ComplianceRequest) -> ComplianceReport {
        let start = Instant::now();
        let requested: Vec<String> = match &req.calculators {
            Some(names) => names.clone(),
            None => CalculatorKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
        };

        let mut kinds = Vec::with_capacity(requested.len());
        let mut unknown_calculators = Vec::new();
        for name in &requested {
            match CalculatorKind::parse(name) {
                Some(kind) => kinds.push(kind),
                None => {
                    warn!(calculator = %name, "unknown calculator ignored");
                    unknown_calculators.push(name.clone());
                }
            }
        }
        info!(calculators = kinds.len(), "compliance run started");

        // join_all yields results in input order.
        let results: Vec<ValidationResult> = join_all(
            kinds
                .iter()
                .map(|kind| validate_calculator(&self.probe, &self.registry, *kind)),
        )
        .await;

        let summary = ComplianceSummary::of(&results);
        let line_items: Vec<TestResult> = results.iter().map(compliance_line_item).collect();
        let run = RunRecord::from_results(
            "Engineering Compliance Validation",
            &self.environment,
            &line_items,
            start.elapsed().as_millis() as u64,
        );
        let run_id = self.persist(&run, &line_items).await;
        info!(
            accuracy = summary.overall_accuracy,
            grade = %summary.overall_grade,
            "compliance run finished"
        );

        ComplianceReport {
            success: true,
            summary,
            results,
            unknown_calculators,
            run_id,
            timestamp: Utc::now(),
        }
    }

    async fn persist(&self, run: &RunRecord, results: &[TestResult]) -> Option<Uuid> {
        match self.recorder.record_run(run, results).await {
            Ok(()) => Some(run.id),
            Err(e) => {
                warn!(run = %run.run_name, error = %e, "failed to record run");
                None
            }
        }
    }
}

fn journey_line_item(r: &JourneyResult) -> TestResult {
    let details = json!({
        "status": r.status,
        "uxScore": r.ux_score,
        "completionRate": r.completion_rate,
        "abandoned": r.abandoned,
    });
    if r.is_success() {
        return TestResult::passed(r.label(), "ux_journey", r.total_duration_ms, details);
    }
    let reason = if r.frustrations.is_empty() {
        format!("Critical success rate {:.2}", r.critical_success_rate)
    } else {
        r.frustrations.join("; ")
    };
    let mut item = TestResult::failed(r.label(), "ux_journey", r.total_duration_ms, reason);
    item.details = Some(details);
    item
}

fn stress_metrics(results: &[JourneyResult]) -> Vec<StressMetric> {
    let now = Utc::now();
    results
        .iter()
        .flat_map(|r| {
            r.steps.iter().filter_map(move |s| {
                s.endpoint.as_ref().map(|endpoint| StressMetric {
                    endpoint: endpoint.clone(),
                    persona_id: r.persona_id.clone(),
                    journey_id: r.journey_id.clone(),
                    response_time_ms: s.duration_ms,
                    success: s.status != crate::journey::StepStatus::Failed,
                    error_message: s.error.clone(),
                    recorded_at: now,
                })
            })
        })
        .collect()
}

fn compliance_line_item(r: &ValidationResult) -> TestResult {
    let name = format!("{} compliance", r.calculator);
    let details = json!({
        "accuracy": r.overall_accuracy,
        "grade": r.grade,
        "testsRun": r.tests_run,
        "issues": r.issues.len(),
    });
    let critical = r.critical_failures();
    if r.overall_accuracy >= COMPLIANCE_PASS_ACCURACY && critical == 0 {
        TestResult::passed(name, "compliance", 0, details)
    } else {
        let mut item = TestResult::failed(
            name,
            "compliance",
            0,
            format!(
                "Accuracy {:.1}% (grade {}), {} critical check(s) failing",
                r.overall_accuracy, r.grade, critical
            ),
        );
        item.details = Some(details);
        item
    }
}
