//! QA Coordination Library
//!
//! Automated validation for a structural-engineering platform's HTTP
//! endpoints. This library provides:
//! - A probe client that turns single endpoint calls into classified test results
//! - Test plans, AI-generated through an OpenAI-compatible gateway with hard-coded fallbacks
//! - Benchmark fixtures and ACI 318-19 compliance rules for the calculators
//! - Persona-weighted user-journey simulation with a derived UX score
//! - An orchestrator tying these into three report-producing entry modes
//!
//! # Entry modes
//!
//! - **Test runner**: plan a feature battery, probe every endpoint, analyse.
//! - **UX tester**: run personas through journeys, score the experience.
//! - **Compliance validator**: run calculator fixtures, check outputs against
//!   expected ranges and code rules, grade each calculator.
//!
//! # Degradation
//!
//! The AI gateway is optional. Planning and analysis go through
//! [`resilience::resilient_call`] and fall back to deterministic output, so a
//! run always produces a complete report.

#![allow(clippy::uninlined_format_args)]

pub mod analysis;
pub mod benchmark;
pub mod compliance;
pub mod journey;
pub mod llm;
pub mod orchestrator;
pub mod plan;
pub mod probe;
pub mod prompts;
pub mod recorder;
pub mod resilience;

// Re-export probe types
pub use probe::{ProbeClient, ProbeConfig, ProbeError, TestResult, TestStatus};

// Re-export AI gateway types
pub use llm::{ChatMessage, GatewayClient, GatewayConfig, LanguageModel, LlmError, ModelChoice, ToolSpec};

// Re-export plan and analysis types
pub use analysis::{Analysis, AnalysisSubject, Analyzer};
pub use plan::{Feature, PlanProvider, TestPlan};

// Re-export benchmark and compliance types
pub use benchmark::{BenchmarkRegistry, BenchmarkTest, CalculatorKind, OutputRange};
pub use compliance::{Grade, Severity, ValidationCheck, ValidationResult};

// Re-export journey types
pub use journey::{
    Catalog, CatalogError, Journey, JourneyResult, JourneySimulator, JourneyStatus, JourneyStep,
    SimulatorConfig, UserPersona,
};

// Re-export persistence types
pub use recorder::{MemoryRecorder, RecorderError, RunRecord, RunRecorder, StressMetric};

// Re-export orchestrator types
pub use orchestrator::{
    ComplianceReport, ComplianceRequest, Orchestrator, Report, RunRequest, TestRunReport,
    TestRunRequest, UxReport, UxRequest,
};

// Re-export resilience types
pub use resilience::{resilient_call, DegradationLevel, DegradedResponse};
