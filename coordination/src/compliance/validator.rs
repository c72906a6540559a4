//! Benchmark validation: run fixtures through a calculator endpoint and
//! grade the results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{validate, Severity, ValidationCheck};
use crate::benchmark::{BenchmarkRegistry, BenchmarkTest, CalculatorKind};
use crate::probe::ProbeClient;

/// Weight of the check pass-rate in the overall accuracy.
const CHECK_WEIGHT: f64 = 0.6;
/// Weight of the output-range pass-rate in the overall accuracy.
const OUTPUT_WEIGHT: f64 = 0.4;
/// Below this accuracy a generic calibration suggestion is emitted.
const SUGGESTION_ACCURACY_THRESHOLD: f64 = 90.0;

pub const STANDARD_ACI_318: &str = "ACI_318";
pub const STANDARD_EUROCODE_2: &str = "EUROCODE_2";
pub const STANDARD_SBC_304: &str = "SBC_304";

/// Letter grade; ordering follows quality (`F < D < … < A+`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    #[serde(rename = "B-")]
    BMinus,
    B,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "A-")]
    AMinus,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    pub fn from_accuracy(accuracy: f64) -> Self {
        match accuracy {
            a if a >= 98.0 => Self::APlus,
            a if a >= 95.0 => Self::A,
            a if a >= 92.0 => Self::AMinus,
            a if a >= 88.0 => Self::BPlus,
            a if a >= 85.0 => Self::B,
            a if a >= 80.0 => Self::BMinus,
            a if a >= 70.0 => Self::C,
            a if a >= 60.0 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub calculator: CalculatorKind,
    /// 0..=100, one decimal.
    pub overall_accuracy: f64,
    pub standards_compliance: BTreeMap<String, bool>,
    pub checks: Vec<ValidationCheck>,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub grade: Grade,
    pub tests_run: usize,
}

impl ValidationResult {
    pub fn failing_count(&self, severity: Severity) -> usize {
        self.checks.iter().filter(|c| c.is_failing(severity)).count()
    }

    pub fn critical_failures(&self) -> usize {
        self.failing_count(Severity::Critical)
    }
}

/// Outcome of calling the calculator for one fixture.
#[derive(Debug, Clone)]
pub struct FixtureRun<'a> {
    pub fixture: &'a BenchmarkTest,
    /// Calculator outputs, or the reason the call failed.
    pub outcome: Result<Map<String, Value>, String>,
}

/// Invoke every fixture of `kind` and grade the outcomes.
pub async fn validate_calculator(
    probe: &ProbeClient,
    registry: &BenchmarkRegistry,
    kind: CalculatorKind,
) -> ValidationResult {
    let fixtures = registry.get(kind);
    let mut runs = Vec::with_capacity(fixtures.len());

    for fixture in fixtures {
        let input = Value::Object(fixture.inputs.clone());
        let outcome = probe
            .invoke(kind.endpoint(), &input)
            .await
            .map(calculation_outputs)
            .map_err(|e| e.to_string());
        debug!(calculator = %kind, fixture = %fixture.name, ok = outcome.is_ok(), "fixture evaluated");
        runs.push(FixtureRun { fixture, outcome });
    }

    let result = assess(kind, &runs);
    info!(
        calculator = %kind,
        accuracy = result.overall_accuracy,
        grade = %result.grade,
        issues = result.issues.len(),
        "calculator validated"
    );
    result
}

/// Outputs are the body itself or its `results` object.
fn calculation_outputs(body: Value) -> Map<String, Value> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Object(results)) => results,
            Some(other) => {
                map.insert("results".to_string(), other);
                map
            }
            None => map,
        },
        _ => Map::new(),
    }
}

/// Grade a set of fixture runs. Pure; order of checks and issues follows
/// the order of `runs`.
pub fn assess(kind: CalculatorKind, runs: &[FixtureRun<'_>]) -> ValidationResult {
    let mut checks: Vec<ValidationCheck> = Vec::new();
    let mut issues = Vec::new();
    let mut output_checks = 0usize;
    let mut outputs_passed = 0usize;

    for run in runs {
        let fixture = run.fixture;
        let outputs = match &run.outcome {
            Ok(outputs) => outputs,
            Err(e) => {
                issues.push(format!("{}: calculation failed: {}", fixture.name, e));
                continue;
            }
        };

        let fixture_checks = validate(kind, &fixture.inputs, outputs);
        for check in fixture_checks.iter().filter(|c| !c.passed) {
            issues.push(format!(
                "[{}] {}: expected {}, actual {} ({})",
                check.severity, check.name, check.expected, check.actual, fixture.name
            ));
        }
        checks.extend(fixture_checks);

        for (key, range) in &fixture.expected_outputs {
            output_checks += 1;
            match outputs.get(key) {
                None | Some(Value::Null) => {
                    issues.push(format!("Missing output '{}' ({})", key, fixture.name));
                }
                Some(value) => match super::number(outputs, key) {
                    Some(actual) if range.contains(actual) => outputs_passed += 1,
                    Some(actual) => issues.push(format!(
                        "Output '{}' = {} outside expected {} ({})",
                        key, actual, range, fixture.name
                    )),
                    None => issues.push(format!(
                        "Output '{}' is not numeric: {} ({})",
                        key, value, fixture.name
                    )),
                },
            }
        }
    }

    let passed_checks = checks.iter().filter(|c| c.passed).count();
    let check_accuracy = ratio(passed_checks, checks.len());
    let output_accuracy = ratio(outputs_passed, output_checks);
    let overall_accuracy =
        round1((check_accuracy * CHECK_WEIGHT + output_accuracy * OUTPUT_WEIGHT) * 100.0);

    let critical = checks.iter().filter(|c| c.is_failing(Severity::Critical)).count();
    let warnings = checks.iter().filter(|c| c.is_failing(Severity::Warning)).count();

    let mut suggestions = Vec::new();
    if critical > 0 {
        suggestions.push(format!(
            "Fix {} critical compliance failure(s) before relying on {} results",
            critical, kind
        ));
    }
    if warnings > 0 {
        suggestions.push(format!(
            "Review {} warning-level check(s) against ACI 318-19 detailing limits",
            warnings
        ));
    }
    if overall_accuracy < SUGGESTION_ACCURACY_THRESHOLD {
        suggestions.push(format!(
            "Calibrate {} calculator outputs against benchmark ranges to raise accuracy above 90%",
            kind
        ));
    }

    // EUROCODE_2 and SBC_304 are reported but not evaluated.
    let aci_ok = !checks
        .iter()
        .any(|c| !c.passed && c.standard.contains("ACI"));
    let mut standards_compliance = BTreeMap::new();
    standards_compliance.insert(STANDARD_ACI_318.to_string(), aci_ok);
    standards_compliance.insert(STANDARD_EUROCODE_2.to_string(), true);
    standards_compliance.insert(STANDARD_SBC_304.to_string(), true);

    ValidationResult {
        calculator: kind,
        overall_accuracy,
        standards_compliance,
        checks,
        issues,
        suggestions,
        grade: Grade::from_accuracy(overall_accuracy),
        tests_run: runs.len(),
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outputs(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn foundation_fixture() -> BenchmarkTest {
        BenchmarkTest::new(
            "Footing",
            json!({"columnLoad": 900, "bearingCapacity": 150}),
            &[
                ("bearingPressure", 100.0, 150.0, "kPa"),
                ("footingDepth", 300.0, 700.0, "mm"),
            ],
        )
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_accuracy(95.0), Grade::A);
        assert_eq!(Grade::from_accuracy(94.9), Grade::AMinus);
        assert_eq!(Grade::from_accuracy(98.0), Grade::APlus);
        assert_eq!(Grade::from_accuracy(88.0), Grade::BPlus);
        assert_eq!(Grade::from_accuracy(80.0), Grade::BMinus);
        assert_eq!(Grade::from_accuracy(79.9), Grade::C);
        assert_eq!(Grade::from_accuracy(60.0), Grade::D);
        assert_eq!(Grade::from_accuracy(59.9), Grade::F);
        assert_eq!(Grade::from_accuracy(0.0), Grade::F);
    }

    #[test]
    fn test_grade_is_monotonic() {
        let mut prev = Grade::from_accuracy(0.0);
        for tenth in 0..=1000 {
            let g = Grade::from_accuracy(tenth as f64 / 10.0);
            assert!(g >= prev, "grade dropped at {}", tenth as f64 / 10.0);
            prev = g;
        }
        assert_eq!(prev, Grade::APlus);
    }

    #[test]
    fn test_grade_serializes_as_letters() {
        assert_eq!(serde_json::to_value(Grade::APlus).unwrap(), json!("A+"));
        assert_eq!(serde_json::to_value(Grade::BMinus).unwrap(), json!("B-"));
        assert_eq!(serde_json::to_value(Grade::C).unwrap(), json!("C"));
    }

    #[test]
    fn test_all_passing_scores_100() {
        let fixture = foundation_fixture();
        let runs = vec![FixtureRun {
            fixture: &fixture,
            outcome: Ok(outputs(json!({"bearingPressure": 120, "footingDepth": 400}))),
        }];
        let r = assess(CalculatorKind::Foundation, &runs);
        assert_eq!(r.overall_accuracy, 100.0);
        assert_eq!(r.grade, Grade::APlus);
        assert!(r.issues.is_empty());
        assert!(r.suggestions.is_empty());
        assert_eq!(r.standards_compliance[STANDARD_ACI_318], true);
        assert_eq!(r.tests_run, 1);
    }

    #[test]
    fn test_bearing_overload_reports_issue_with_both_values() {
        let fixture = foundation_fixture();
        let runs = vec![FixtureRun {
            fixture: &fixture,
            outcome: Ok(outputs(json!({"bearingPressure": 160, "footingDepth": 400}))),
        }];
        let r = assess(CalculatorKind::Foundation, &runs);

        assert_eq!(r.critical_failures(), 1);
        let issue = r
            .issues
            .iter()
            .find(|i| i.contains("Bearing Pressure"))
            .expect("bearing issue");
        assert!(issue.contains("150.0") && issue.contains("160.0"), "{issue}");
        assert!(issue.starts_with("[critical]"));
        assert_eq!(r.standards_compliance[STANDARD_ACI_318], false);
        assert_eq!(r.standards_compliance[STANDARD_EUROCODE_2], true);
        assert_eq!(r.standards_compliance[STANDARD_SBC_304], true);

        // checks 1/2, outputs 1/2 (160 > 150) → (0.5*0.6 + 0.5*0.4) * 100
        assert_eq!(r.overall_accuracy, 50.0);
        assert_eq!(r.grade, Grade::F);
        assert_eq!(r.suggestions.len(), 2);
        assert!(r.suggestions[0].contains("1 critical"));
    }

    #[test]
    fn test_missing_output_is_issue_and_counts_against_accuracy() {
        let fixture = foundation_fixture();
        let runs = vec![FixtureRun {
            fixture: &fixture,
            outcome: Ok(outputs(json!({"bearingPressure": 120}))),
        }];
        let r = assess(CalculatorKind::Foundation, &runs);
        assert!(r.issues.iter().any(|i| i.starts_with("Missing output 'footingDepth'")));
        // checks 1/1, outputs 1/2 → 60 + 20
        assert_eq!(r.overall_accuracy, 80.0);
        assert_eq!(r.grade, Grade::BMinus);
        assert_eq!(r.suggestions.len(), 1);
    }

    #[test]
    fn test_failed_call_adds_issue_and_no_checks() {
        let fixture = foundation_fixture();
        let runs = vec![FixtureRun {
            fixture: &fixture,
            outcome: Err("Calculation crashed".into()),
        }];
        let r = assess(CalculatorKind::Foundation, &runs);
        assert!(r.checks.is_empty());
        assert_eq!(r.tests_run, 1);
        assert_eq!(r.overall_accuracy, 0.0);
        assert_eq!(r.grade, Grade::F);
        assert_eq!(r.issues, vec!["Footing: calculation failed: Calculation crashed".to_string()]);
    }

    #[test]
    fn test_accuracy_rounds_to_one_decimal() {
        let fixture = BenchmarkTest::new(
            "Wall",
            json!({}),
            &[("fosOverturning", 1.5, 4.0, ""), ("fosSliding", 1.5, 3.0, ""), ("maxBearingPressure", 60.0, 200.0, "kPa")],
        );
        let runs = vec![FixtureRun {
            fixture: &fixture,
            outcome: Ok(outputs(json!({"fosOverturning": 2.0, "fosSliding": 1.2, "maxBearingPressure": 90}))),
        }];
        let r = assess(CalculatorKind::RetainingWall, &runs);
        // checks 1/2 → 0.3, outputs 2/3 → 0.2667 → 56.666.. → 56.7
        assert_eq!(r.overall_accuracy, 56.7);
    }

    #[test]
    fn test_results_wrapper_is_unwrapped() {
        let outputs = calculation_outputs(json!({"results": {"maxMoment": 10}, "meta": 1}));
        assert_eq!(outputs.get("maxMoment"), Some(&json!(10)));
        assert!(outputs.get("meta").is_none());
        let outputs = calculation_outputs(json!({"maxMoment": 10}));
        assert_eq!(outputs.get("maxMoment"), Some(&json!(10)));
    }
}
