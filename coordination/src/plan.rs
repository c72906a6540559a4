//! Test plans and the plan provider.
//!
//! A plan comes from the AI gateway (forced `create_test_plan` call) when
//! one is configured and answers sensibly; otherwise from the hard-coded
//! table below. `generate_plan` never fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::llm::{ChatMessage, LanguageModel, LlmError, ModelChoice};
use crate::prompts;
use crate::resilience::{resilient_call, DegradedResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    pub goal: String,
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_outcomes: Vec<String>,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

/// Test battery selector for the test-runner mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Feature {
    Calculators,
    Security,
    Ai,
    Database,
    Custom(String),
}

impl Feature {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "calculators" => Self::Calculators,
            "security" => Self::Security,
            "ai" => Self::Ai,
            "database" => Self::Database,
            _ => Self::Custom(name.trim().to_string()),
        }
    }

    /// Features a request name runs; `"all"` is calculators, security, database.
    pub fn expand(request: &str) -> Vec<Self> {
        if request.trim().eq_ignore_ascii_case("all") {
            vec![Self::Calculators, Self::Security, Self::Database]
        } else {
            vec![Self::parse(request)]
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Calculators => "calculators",
            Self::Security => "security",
            Self::Ai => "ai",
            Self::Database => "database",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl TestPlan {
    /// Hard-coded plan for a feature.
    pub fn fallback(feature: &Feature) -> Self {
        match feature {
            Feature::Calculators => Self {
                goal: "Verify every structural calculator returns a valid result".to_string(),
                steps: strings(&[
                    "Call each calculator with a representative design case",
                    "Confirm the response is JSON without an error field",
                    "Record response times",
                ]),
                expected_outcomes: strings(&[
                    "All calculators respond with HTTP 200",
                    "Responses contain calculated values",
                ]),
                endpoints: strings(&[
                    "calculate-beam",
                    "calculate-column",
                    "calculate-foundation",
                    "calculate-slab",
                    "calculate-retaining-wall",
                ]),
            },
            Feature::Security => Self {
                goal: "Verify endpoints reject malicious and malformed input".to_string(),
                steps: strings(&[
                    "Send script and SQL injection strings as numeric fields",
                    "Send negative and overflowing values",
                    "Send a prompt-injection message to the assistant",
                ]),
                expected_outcomes: strings(&[
                    "Hostile input is rejected with a 4xx status or an error field",
                    "No endpoint fails with a server error",
                ]),
                endpoints: strings(&["calculate-beam", "calculate-column", "ai-chat"]),
            },
            Feature::Ai => Self {
                goal: "Verify the AI assistant answers engineering questions".to_string(),
                steps: strings(&[
                    "Ask the assistant a code question",
                    "Ask for an explanation of a beam result",
                ]),
                expected_outcomes: strings(&["Both endpoints return a non-empty answer"]),
                endpoints: strings(&["ai-chat", "explain-calculation"]),
            },
            Feature::Database => Self {
                goal: "Verify database connectivity and test-run history".to_string(),
                steps: strings(&["Check database health", "List recent test runs"]),
                expected_outcomes: strings(&[
                    "Health check reports the database as reachable",
                    "Recent runs are returned as a list",
                ]),
                endpoints: strings(&["db-health", "list-test-runs"]),
            },
            Feature::Custom(name) => Self {
                goal: format!("Test {name} functionality"),
                steps: strings(&["Run basic functionality test"]),
                expected_outcomes: strings(&["Feature works as expected"]),
                endpoints: Vec::new(),
            },
        }
    }

    /// Parse and sanity-check the arguments of a `create_test_plan` call.
    pub fn from_tool_arguments(args: Value) -> Result<Self, LlmError> {
        let plan: TestPlan =
            serde_json::from_value(args).map_err(|e| LlmError::ParseError(e.to_string()))?;
        if plan.goal.trim().is_empty() || plan.steps.is_empty() {
            return Err(LlmError::ParseError("plan has no goal or steps".to_string()));
        }
        Ok(plan)
    }
}

/// Produces test plans, AI-generated when a model is configured.
#[derive(Clone, Default)]
pub struct PlanProvider {
    model: Option<Arc<dyn LanguageModel>>,
}

impl PlanProvider {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    pub async fn generate_plan(
        &self,
        feature: &Feature,
        choice: ModelChoice,
    ) -> DegradedResponse<TestPlan> {
        let response = match &self.model {
            Some(model) => {
                resilient_call(
                    "plan",
                    choice.model_id(),
                    request_plan(model.as_ref(), feature, choice),
                    || TestPlan::fallback(feature),
                )
                .await
            }
            None => DegradedResponse::fallback(
                TestPlan::fallback(feature),
                &format!("plan: {}", LlmError::NotConfigured),
            ),
        };
        info!(
            feature = %feature,
            source = %response.served_by,
            endpoints = response.payload.endpoints.len(),
            prompt_version = prompts::PROMPT_VERSION,
            "test plan ready"
        );
        response
    }
}

async fn request_plan(
    model: &dyn LanguageModel,
    feature: &Feature,
    choice: ModelChoice,
) -> Result<TestPlan, LlmError> {
    let messages = [
        ChatMessage::system(prompts::planner_system_prompt()),
        ChatMessage::user(prompts::planner_user_prompt(feature.name())),
    ];
    let args = model
        .call_tool(choice.model_id(), &messages, &prompts::plan_tool())
        .await?;
    TestPlan::from_tool_arguments(args)
}
