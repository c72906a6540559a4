//! Benchmark Module
//!
//! Static, data-driven fixtures for calculator validation and the literal
//! inputs used by probe batteries.
//!
//! # Architecture
//!
//! ```text
//! CalculatorKind ──→ BenchmarkRegistry ──→ [BenchmarkTest { inputs, expectedOutputs }]
//!                                                  ↓
//!                                     compliance::validator (accuracy, grade)
//!
//! endpoint name ──→ inputs::test_inputs ──→ [input, ...]  (always non-empty)
//! ```
//!
//! Adding a fixture or an endpoint input never requires touching the code
//! that consumes them.

pub mod inputs;
pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use inputs::{hostile_payloads, is_known_endpoint, test_inputs, KNOWN_ENDPOINTS};
pub use registry::{BenchmarkRegistry, RegistryError};

/// Calculator types with benchmark fixtures and compliance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculatorKind {
    Beam,
    Column,
    Foundation,
    Slab,
    #[serde(rename = "retaining-wall", alias = "retaining_wall")]
    RetainingWall,
}

impl CalculatorKind {
    /// Default validation order.
    pub const ALL: [CalculatorKind; 5] = [
        Self::Beam,
        Self::Column,
        Self::Foundation,
        Self::Slab,
        Self::RetainingWall,
    ];

    /// Parse a request name; accepts both `retaining-wall` and `retaining_wall`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "beam" => Some(Self::Beam),
            "column" => Some(Self::Column),
            "foundation" => Some(Self::Foundation),
            "slab" => Some(Self::Slab),
            "retaining-wall" | "retaining_wall" => Some(Self::RetainingWall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beam => "beam",
            Self::Column => "column",
            Self::Foundation => "foundation",
            Self::Slab => "slab",
            Self::RetainingWall => "retaining-wall",
        }
    }

    /// Name of the calculation endpoint serving this calculator.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Beam => "calculate-beam",
            Self::Column => "calculate-column",
            Self::Foundation => "calculate-foundation",
            Self::Slab => "calculate-slab",
            Self::RetainingWall => "calculate-retaining-wall",
        }
    }
}

impl std::fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive acceptance range for one numeric output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

impl OutputRange {
    pub fn new(min: f64, max: f64, unit: &str) -> Self {
        Self {
            min,
            max,
            unit: unit.to_string(),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_well_formed(&self) -> bool {
        self.min <= self.max
    }
}

impl std::fmt::Display for OutputRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{} {}", self.min, self.max, self.unit)
    }
}

/// One literal input with expected output ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkTest {
    pub name: String,
    pub inputs: Map<String, Value>,
    pub expected_outputs: BTreeMap<String, OutputRange>,
}

impl BenchmarkTest {
    /// Build a fixture from a JSON object literal and `(key, min, max, unit)` rows.
    pub fn new(name: &str, inputs: Value, outputs: &[(&str, f64, f64, &str)]) -> Self {
        let inputs = match inputs {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let expected_outputs = outputs
            .iter()
            .map(|(key, min, max, unit)| (key.to_string(), OutputRange::new(*min, *max, unit)))
            .collect();
        Self {
            name: name.to_string(),
            inputs,
            expected_outputs,
        }
    }

    /// First output key whose range violates `min <= max`.
    pub fn malformed_range(&self) -> Option<&str> {
        self.expected_outputs
            .iter()
            .find(|(_, r)| !r.is_well_formed())
            .map(|(k, _)| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_accepts_both_wall_spellings() {
        assert_eq!(
            CalculatorKind::parse("retaining-wall"),
            Some(CalculatorKind::RetainingWall)
        );
        assert_eq!(
            CalculatorKind::parse("Retaining_Wall"),
            Some(CalculatorKind::RetainingWall)
        );
        assert_eq!(CalculatorKind::parse("truss"), None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_value(CalculatorKind::RetainingWall).unwrap(),
            json!("retaining-wall")
        );
        let k: CalculatorKind = serde_json::from_value(json!("retaining_wall")).unwrap();
        assert_eq!(k, CalculatorKind::RetainingWall);
        let k: CalculatorKind = serde_json::from_value(json!("beam")).unwrap();
        assert_eq!(k, CalculatorKind::Beam);
    }

    #[test]
    fn test_endpoint_names() {
        assert_eq!(CalculatorKind::Beam.endpoint(), "calculate-beam");
        assert_eq!(
            CalculatorKind::RetainingWall.endpoint(),
            "calculate-retaining-wall"
        );
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let r = OutputRange::new(140.0, 165.0, "kN·m");
        assert!(r.contains(140.0));
        assert!(r.contains(165.0));
        assert!(!r.contains(165.01));
    }

    #[test]
    fn test_fixture_builder() {
        let t = BenchmarkTest::new(
            "x",
            json!({"span": 6}),
            &[("maxMoment", 10.0, 5.0, "kN·m")],
        );
        assert_eq!(t.inputs["span"], json!(6));
        assert_eq!(t.malformed_range(), Some("maxMoment"));
    }
}
