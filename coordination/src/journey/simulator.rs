//! Journey simulation.
//!
//! Plays one persona through one journey step by step. UI steps sleep for
//! the persona's think time (capped so suites finish quickly); API steps
//! call the named endpoint through the probe client. Step results feed
//! the frustration/highlight lists and the 0-100 UX score.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::catalog::{Journey, JourneyStep, Patience, UserPersona};
use crate::probe::{error_field, ProbeClient};

/// Frustration recorded when a low-patience persona gives up.
pub const ABANDONMENT_MESSAGE: &str = "User abandoned journey due to multiple failures";

/// Frustrations that make a low-patience persona abandon.
pub const ABANDON_AFTER_FRUSTRATIONS: usize = 2;

/// API steps slower than this multiple of the expectation are slow.
const SLOW_FACTOR: f64 = 1.5;
/// Critical steps faster than this multiple of the expectation are highlights.
const FAST_FACTOR: f64 = 0.7;

const MAX_SPEED_BONUS: f64 = 15.0;
const MAX_SPEED_PENALTY: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Upper bound on any single UI think-time sleep.
    pub think_time_cap: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            think_time_cap: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Slow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub expected_duration_ms: u64,
    pub critical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JourneyStatus {
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResult {
    pub persona_id: String,
    pub persona: String,
    pub journey_id: String,
    pub journey: String,
    pub status: JourneyStatus,
    pub completion_rate: f64,
    pub critical_success_rate: f64,
    pub total_duration_ms: u64,
    pub ux_score: u32,
    pub steps: Vec<StepOutcome>,
    pub frustrations: Vec<String>,
    pub highlights: Vec<String>,
    pub abandoned: bool,
}

impl JourneyResult {
    pub fn is_success(&self) -> bool {
        self.status == JourneyStatus::Success
    }

    /// One-line label used in analysis prompts and persisted results.
    pub fn label(&self) -> String {
        format!("{} / {}", self.persona, self.journey)
    }
}

/// Speed term of the UX score.
///
/// `ratio = expected / actual`; faster than expected earns up to +15,
/// slower costs up to -20. A zero actual duration counts as infinitely fast.
pub fn speed_adjustment(expected_total_ms: u64, actual_total_ms: u64) -> f64 {
    if actual_total_ms == 0 {
        return MAX_SPEED_BONUS;
    }
    let ratio = expected_total_ms as f64 / actual_total_ms as f64;
    if ratio >= 1.0 {
        ((ratio - 1.0) * 10.0).min(MAX_SPEED_BONUS)
    } else {
        -((1.0 - ratio) * 40.0).min(MAX_SPEED_PENALTY)
    }
}

/// 0-100 UX score.
pub fn ux_score(
    critical_success: f64,
    expected_total_ms: u64,
    actual_total_ms: u64,
    frustrations: usize,
    highlights: usize,
) -> u32 {
    let score = 50.0 + critical_success * 30.0
        + speed_adjustment(expected_total_ms, actual_total_ms)
        - frustrations as f64 * 5.0
        + highlights as f64 * 3.0;
    score.clamp(0.0, 100.0).round() as u32
}

pub fn classify(critical_success: f64, frustrations: usize) -> JourneyStatus {
    if critical_success < 0.5 {
        JourneyStatus::Failed
    } else if critical_success < 1.0 || frustrations > 2 {
        JourneyStatus::Partial
    } else {
        JourneyStatus::Success
    }
}

pub struct JourneySimulator<'a> {
    probe: &'a ProbeClient,
    config: SimulatorConfig,
}

impl<'a> JourneySimulator<'a> {
    pub fn new(probe: &'a ProbeClient, config: SimulatorConfig) -> Self {
        Self { probe, config }
    }

    pub async fn simulate(&self, journey: &Journey, persona: &UserPersona) -> JourneyResult {
        let mut steps = Vec::with_capacity(journey.steps.len());
        let mut frustrations = Vec::new();
        let mut highlights = Vec::new();
        let mut total_duration_ms = 0u64;
        let mut abandoned = false;

        for step in &journey.steps {
            let outcome = self.run_step(step, persona).await;
            total_duration_ms += outcome.duration_ms;

            match outcome.status {
                StepStatus::Failed if step.critical_for_success => frustrations.push(format!(
                    "Critical step '{}' failed: {}",
                    step.action,
                    outcome.error.as_deref().unwrap_or("unknown error")
                )),
                StepStatus::Slow => frustrations.push(format!(
                    "'{}' was slow: {}ms (expected {}ms)",
                    step.action, outcome.duration_ms, step.expected_duration_ms
                )),
                StepStatus::Passed
                    if step.critical_for_success
                        && (outcome.duration_ms as f64)
                            < step.expected_duration_ms as f64 * FAST_FACTOR =>
                {
                    highlights.push(format!(
                        "'{}' completed quickly: {}ms (expected {}ms)",
                        step.action, outcome.duration_ms, step.expected_duration_ms
                    ))
                }
                _ => {}
            }
            steps.push(outcome);

            if persona.patience == Patience::Low && frustrations.len() >= ABANDON_AFTER_FRUSTRATIONS
            {
                frustrations.push(ABANDONMENT_MESSAGE.to_string());
                abandoned = true;
                break;
            }
        }

        let completed = steps.iter().filter(|s| s.status != StepStatus::Failed).count();
        let completion_rate = ratio(completed, journey.steps.len());

        let critical_total = journey.critical_step_count();
        let critical_passed = steps
            .iter()
            .filter(|s| s.critical && s.status != StepStatus::Failed)
            .count();
        let critical_success_rate = ratio(critical_passed, critical_total);

        let ux_score = ux_score(
            critical_success_rate,
            journey.expected_total_time_ms,
            total_duration_ms,
            frustrations.len(),
            highlights.len(),
        );
        let status = classify(critical_success_rate, frustrations.len());

        info!(
            persona = %persona.id,
            journey = %journey.id,
            ?status,
            ux_score,
            abandoned,
            "journey simulated"
        );

        JourneyResult {
            persona_id: persona.id.clone(),
            persona: persona.name.clone(),
            journey_id: journey.id.clone(),
            journey: journey.name.clone(),
            status,
            completion_rate,
            critical_success_rate,
            total_duration_ms,
            ux_score,
            steps,
            frustrations,
            highlights,
            abandoned,
        }
    }

    async fn run_step(&self, step: &JourneyStep, persona: &UserPersona) -> StepOutcome {
        let (status, duration_ms, error) = match &step.endpoint {
            None => (StepStatus::Passed, self.think(step, persona).await, None),
            Some(endpoint) => {
                let input = step.input.clone().unwrap_or_else(|| json!({}));
                self.call(endpoint, &input, step.expected_duration_ms).await
            }
        };
        debug!(action = %step.action, ?status, duration_ms, "journey step");

        StepOutcome {
            action: step.action.clone(),
            endpoint: step.endpoint.clone(),
            status,
            duration_ms,
            expected_duration_ms: step.expected_duration_ms,
            critical: step.critical_for_success,
            error,
        }
    }

    /// Sleep for the persona's think time; returns the measured duration.
    async fn think(&self, step: &JourneyStep, persona: &UserPersona) -> u64 {
        let wanted = Duration::from_millis(
            (step.expected_duration_ms as f64 * persona.patience.think_time_multiplier()) as u64,
        );
        let start = Instant::now();
        tokio::time::sleep(wanted.min(self.config.think_time_cap)).await;
        start.elapsed().as_millis() as u64
    }

    async fn call(
        &self,
        endpoint: &str,
        input: &Value,
        expected_duration_ms: u64,
    ) -> (StepStatus, u64, Option<String>) {
        let outcome = self.probe.send(endpoint, input).await;
        let duration_ms = outcome.duration_ms();

        let raw = match outcome.response {
            Ok(raw) => raw,
            Err(e) => return (StepStatus::Failed, duration_ms, Some(e.to_string())),
        };
        if !raw.is_json() {
            return (
                StepStatus::Failed,
                duration_ms,
                Some("Non-JSON response".to_string()),
            );
        }
        if !raw.is_success() {
            return (
                StepStatus::Failed,
                duration_ms,
                Some(raw.status_error().to_string()),
            );
        }
        let body = match raw.json() {
            Ok(body) => body,
            Err(e) => return (StepStatus::Failed, duration_ms, Some(e.to_string())),
        };
        if let Some(err) = error_field(&body) {
            return (StepStatus::Failed, duration_ms, Some(err));
        }

        if duration_ms as f64 > expected_duration_ms as f64 * SLOW_FACTOR {
            (StepStatus::Slow, duration_ms, None)
        } else {
            (StepStatus::Passed, duration_ms, None)
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_adjustment_bounds() {
        assert_eq!(speed_adjustment(1000, 0), 15.0);
        assert_eq!(speed_adjustment(1000, 1000), 0.0);
        // twice as fast: +10
        assert!((speed_adjustment(2000, 1000) - 10.0).abs() < 1e-9);
        // far faster: capped at +15
        assert_eq!(speed_adjustment(100_000, 1000), 15.0);
        // twice as slow: ratio 0.5 => -20
        assert!((speed_adjustment(1000, 2000) + 20.0).abs() < 1e-9);
        // 25% slow: ratio 0.8 => -8
        assert!((speed_adjustment(800, 1000) + 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_on_time_journey_scores_80() {
        assert_eq!(ux_score(1.0, 1000, 1000, 0, 0), 80);
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(ux_score(1.0, 100_000, 1, 0, 10), 100);
        assert_eq!(ux_score(0.0, 1000, 100_000, 20, 0), 0);
    }

    #[test]
    fn test_frustrations_and_highlights_move_score() {
        let base = ux_score(1.0, 1000, 1000, 0, 0);
        assert_eq!(ux_score(1.0, 1000, 1000, 2, 0), base - 10);
        assert_eq!(ux_score(1.0, 1000, 1000, 0, 1), base + 3);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(1.0, 0), JourneyStatus::Success);
        assert_eq!(classify(1.0, 2), JourneyStatus::Success);
        assert_eq!(classify(1.0, 3), JourneyStatus::Partial);
        assert_eq!(classify(0.5, 0), JourneyStatus::Partial);
        assert_eq!(classify(0.49, 0), JourneyStatus::Failed);
        assert_eq!(classify(0.0, 3), JourneyStatus::Failed);
    }

    #[test]
    fn test_ratio_of_empty_set_is_full() {
        assert_eq!(ratio(0, 0), 1.0);
        assert_eq!(ratio(1, 4), 0.25);
    }
}
