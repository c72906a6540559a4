//! Compliance Rule Engine
//!
//! Pure functions mapping a calculator's `(inputs, outputs)` to a list of
//! named engineering-standard checks. No state is kept between calls, so
//! the same arguments always produce the same checks in the same order.
//!
//! A check is only emitted when every value it needs is present and
//! numeric. Passing checks carry [`Severity::Info`]; failing checks carry
//! the severity assigned to the rule.

pub mod rules;
pub mod standards;
pub mod validator;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::benchmark::CalculatorKind;

pub use validator::{assess, validate_calculator, FixtureRun, Grade, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
    pub standard: String,
    pub severity: Severity,
}

impl ValidationCheck {
    /// Build a check whose severity is `on_failure` only when it fails.
    pub fn evaluate(
        name: &str,
        passed: bool,
        on_failure: Severity,
        expected: String,
        actual: String,
        standard: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            passed,
            expected,
            actual,
            standard: standard.to_string(),
            severity: if passed { Severity::Info } else { on_failure },
        }
    }

    pub fn is_failing(&self, severity: Severity) -> bool {
        !self.passed && self.severity == severity
    }
}

/// Run every rule registered for `kind`.
pub fn validate(
    kind: CalculatorKind,
    inputs: &Map<String, Value>,
    outputs: &Map<String, Value>,
) -> Vec<ValidationCheck> {
    match kind {
        CalculatorKind::Beam => rules::beam(inputs, outputs),
        CalculatorKind::Column => rules::column(inputs, outputs),
        CalculatorKind::Foundation => rules::foundation(inputs, outputs),
        CalculatorKind::Slab => Vec::new(),
        CalculatorKind::RetainingWall => rules::retaining_wall(inputs, outputs),
    }
}

/// Numeric field; numeric strings are accepted.
pub(crate) fn number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn flag(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
