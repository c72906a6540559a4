//! Prompt constants for the AI planning and analysis calls.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever prompt content changes
//! so logged plans and analyses can be traced to the prompt that produced them.

use serde_json::json;

use crate::benchmark::KNOWN_ENDPOINTS;
use crate::llm::ToolSpec;

/// Prompt version. Bump on any prompt content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Name of the forced planning function.
pub const PLAN_TOOL_NAME: &str = "create_test_plan";

/// Failing items embedded in an analysis prompt.
pub const MAX_FAILURES_IN_PROMPT: usize = 5;

const PLANNER_PREAMBLE: &str = "\
You are a QA engineer for a structural engineering web platform. \
You design short, targeted test plans for its HTTP endpoints.

## Rules
- Only use endpoint names from the list below. Never invent endpoints.
- Keep plans small: 2-6 steps, each a single observable action.
- Expected outcomes must be checkable from the HTTP response alone.
- Always answer by calling the create_test_plan function.

## Available endpoints
";

pub const ANALYST_PREAMBLE: &str = "\
You are a senior QA lead reviewing automated test output for a structural \
engineering platform. Write a concise assessment (under 200 words): overall \
health, the most important failures and their likely cause, and the next \
action to take. Plain text, no tables.";

/// System prompt for plan generation, enumerating known endpoints.
pub fn planner_system_prompt() -> String {
    let mut prompt = String::from(PLANNER_PREAMBLE);
    for (name, purpose) in KNOWN_ENDPOINTS {
        prompt.push_str(&format!("- {name}: {purpose}\n"));
    }
    prompt
}

pub fn planner_user_prompt(feature: &str) -> String {
    format!(
        "Create a test plan for the \"{feature}\" feature. \
         List the endpoints to exercise in the `endpoints` field."
    )
}

/// Forced function-call schema mirroring `TestPlan`.
pub fn plan_tool() -> ToolSpec {
    ToolSpec {
        name: PLAN_TOOL_NAME.to_string(),
        description: "Create a structured test plan for a platform feature".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "goal": { "type": "string", "description": "What the plan verifies" },
                "steps": { "type": "array", "items": { "type": "string" } },
                "expectedOutcomes": { "type": "array", "items": { "type": "string" } },
                "endpoints": {
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": KNOWN_ENDPOINTS.iter().map(|(n, _)| *n).collect::<Vec<_>>()
                    }
                }
            },
            "required": ["goal", "steps", "expectedOutcomes", "endpoints"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_prompt_lists_every_endpoint() {
        let prompt = planner_system_prompt();
        for (name, _) in KNOWN_ENDPOINTS {
            assert!(prompt.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_plan_tool_schema_requires_all_fields() {
        let tool = plan_tool();
        assert_eq!(tool.name, "create_test_plan");
        let required = tool.parameters["required"].as_array().unwrap();
        assert_eq!(required.len(), 4);
        let endpoints = &tool.parameters["properties"]["endpoints"]["items"]["enum"];
        assert_eq!(endpoints.as_array().unwrap().len(), KNOWN_ENDPOINTS.len());
    }
}
