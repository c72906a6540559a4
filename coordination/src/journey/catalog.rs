//! Persona and journey catalog.
//!
//! Immutable data loaded once at start-up, either the built-in tables or a
//! TOML file with `[[personas]]` and `[[journeys]]` arrays.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expertise {
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Patience {
    Low,
    Medium,
    High,
}

impl Patience {
    /// Scale applied to a UI step's expected duration.
    pub fn think_time_multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 1.0,
            Self::High => 1.5,
        }
    }
}

/// A simulated user archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPersona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub language: String,
    pub expertise: Expertise,
    pub patience: Patience,
    pub device_type: String,
    /// Words per minute.
    pub typing_speed: u32,
    /// Words per minute.
    pub reading_speed: u32,
}

/// One user action; API-bound when `endpoint` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStep {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    pub expected_duration_ms: u64,
    #[serde(default)]
    pub critical_for_success: bool,
}

impl JourneyStep {
    fn ui(action: &str, expected_duration_ms: u64) -> Self {
        Self {
            action: action.to_string(),
            endpoint: None,
            input: None,
            expected_duration_ms,
            critical_for_success: false,
        }
    }

    fn api(action: &str, endpoint: &str, input: Value, expected_duration_ms: u64, critical: bool) -> Self {
        Self {
            action: action.to_string(),
            endpoint: Some(endpoint.to_string()),
            input: Some(input),
            expected_duration_ms,
            critical_for_success: critical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<JourneyStep>,
    /// Defaults to the sum of step durations when omitted.
    #[serde(default)]
    pub expected_total_time_ms: u64,
}

impl Journey {
    fn new(id: &str, name: &str, description: &str, steps: Vec<JourneyStep>) -> Self {
        let expected_total_time_ms = steps.iter().map(|s| s.expected_duration_ms).sum();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            steps,
            expected_total_time_ms,
        }
    }

    pub fn critical_step_count(&self) -> usize {
        self.steps.iter().filter(|s| s.critical_for_success).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub personas: Vec<UserPersona>,
    pub journeys: Vec<Journey>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            personas: builtin_personas(),
            journeys: builtin_journeys(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let mut catalog: Catalog = toml::from_str(content)?;
        for journey in &mut catalog.journeys {
            if journey.expected_total_time_ms == 0 {
                journey.expected_total_time_ms =
                    journey.steps.iter().map(|s| s.expected_duration_ms).sum();
            }
        }
        catalog.check()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn check(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for p in &self.personas {
            if !seen.insert(p.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate persona id '{}'", p.id)));
            }
        }
        seen.clear();
        for j in &self.journeys {
            if !seen.insert(j.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate journey id '{}'", j.id)));
            }
            if j.steps.is_empty() {
                return Err(CatalogError::Invalid(format!("journey '{}' has no steps", j.id)));
            }
        }
        Ok(())
    }

    pub fn persona(&self, id: &str) -> Option<&UserPersona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn journey(&self, id: &str) -> Option<&Journey> {
        self.journeys.iter().find(|j| j.id == id)
    }

    /// Requested personas in request order; `None` selects all.
    pub fn select_personas(&self, ids: Option<&[String]>) -> Vec<&UserPersona> {
        match ids {
            None => self.personas.iter().collect(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    let found = self.persona(id);
                    if found.is_none() {
                        warn!(persona = %id, "unknown persona ignored");
                    }
                    found
                })
                .collect(),
        }
    }

    /// Requested journeys in request order; `None` selects all.
    pub fn select_journeys(&self, ids: Option<&[String]>) -> Vec<&Journey> {
        match ids {
            None => self.journeys.iter().collect(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    let found = self.journey(id);
                    if found.is_none() {
                        warn!(journey = %id, "unknown journey ignored");
                    }
                    found
                })
                .collect(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn persona(
    id: &str,
    name: &str,
    description: &str,
    language: &str,
    expertise: Expertise,
    patience: Patience,
    device_type: &str,
    typing_speed: u32,
    reading_speed: u32,
) -> UserPersona {
    UserPersona {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        language: language.to_string(),
        expertise,
        patience,
        device_type: device_type.to_string(),
        typing_speed,
        reading_speed,
    }
}

fn builtin_personas() -> Vec<UserPersona> {
    vec![
        persona(
            "novice_student",
            "Novice Student",
            "Civil engineering undergraduate learning reinforced concrete design",
            "en",
            Expertise::Beginner,
            Patience::High,
            "mobile",
            25,
            180,
        ),
        persona(
            "busy_engineer",
            "Busy Structural Engineer",
            "Practising engineer checking a design between meetings",
            "en",
            Expertise::Expert,
            Patience::Low,
            "desktop",
            70,
            320,
        ),
        persona(
            "site_contractor",
            "Site Contractor",
            "Contractor verifying footing and wall sizes on site",
            "ar",
            Expertise::Intermediate,
            Patience::Medium,
            "tablet",
            30,
            200,
        ),
        persona(
            "senior_reviewer",
            "Senior Reviewer",
            "Checking engineer reviewing calculations for code compliance",
            "en",
            Expertise::Expert,
            Patience::Medium,
            "desktop",
            55,
            350,
        ),
    ]
}

fn builtin_journeys() -> Vec<Journey> {
    vec![
        Journey::new(
            "beam_design",
            "Beam Design",
            "Size a simply supported beam and ask the assistant to explain it",
            vec![
                JourneyStep::ui("Open beam calculator", 1500),
                JourneyStep::ui("Enter span and loads", 6000),
                JourneyStep::api(
                    "Run beam calculation",
                    "calculate-beam",
                    json!({
                        "span": 6, "deadLoad": 15, "liveLoad": 10, "beamWidth": 300,
                        "concreteGrade": 30, "steelGrade": 420, "supportType": "simply_supported"
                    }),
                    3000,
                    true,
                ),
                JourneyStep::api(
                    "Ask AI to explain result",
                    "explain-calculation",
                    json!({
                        "calculator": "beam",
                        "inputs": { "span": 6, "deadLoad": 15, "liveLoad": 10, "beamWidth": 300 }
                    }),
                    8000,
                    false,
                ),
                JourneyStep::ui("Review reinforcement detailing", 4000),
            ],
        ),
        Journey::new(
            "column_check",
            "Column Check",
            "Check a square column and its slenderness classification",
            vec![
                JourneyStep::ui("Open column calculator", 1500),
                JourneyStep::ui("Enter column geometry", 5000),
                JourneyStep::api(
                    "Run column calculation",
                    "calculate-column",
                    json!({
                        "axialLoad": 1500, "momentX": 50, "width": 400, "depth": 400,
                        "height": 3.5, "concreteGrade": 30, "steelGrade": 420
                    }),
                    3000,
                    true,
                ),
                JourneyStep::ui("Check slenderness warning", 3000),
            ],
        ),
        Journey::new(
            "foundation_sizing",
            "Foundation Sizing",
            "Size a footing and confirm the adjacent retaining wall is stable",
            vec![
                JourneyStep::ui("Open foundation calculator", 1500),
                JourneyStep::ui("Enter column load and soil capacity", 5000),
                JourneyStep::api(
                    "Run foundation calculation",
                    "calculate-foundation",
                    json!({
                        "columnLoad": 1000, "bearingCapacity": 200, "columnWidth": 400,
                        "concreteGrade": 25, "steelGrade": 420
                    }),
                    3000,
                    true,
                ),
                JourneyStep::api(
                    "Run retaining wall check",
                    "calculate-retaining-wall",
                    json!({
                        "wallHeight": 4, "soilUnitWeight": 18, "frictionAngle": 30,
                        "surcharge": 10, "baseWidth": 2.8, "concreteGrade": 25
                    }),
                    3000,
                    true,
                ),
                JourneyStep::ui("Export summary", 2000),
            ],
        ),
        Journey::new(
            "ai_assistance",
            "AI Assistance",
            "Ask the engineering assistant a code question",
            vec![
                JourneyStep::ui("Open AI assistant", 1000),
                JourneyStep::ui("Type engineering question", 8000),
                JourneyStep::api(
                    "Receive AI answer",
                    "ai-chat",
                    json!({
                        "messages": [{
                            "role": "user",
                            "content": "What is the minimum reinforcement ratio for a beam under ACI 318?"
                        }]
                    }),
                    10000,
                    true,
                ),
                JourneyStep::ui("Read answer", 6000),
            ],
        ),
    ]
}
