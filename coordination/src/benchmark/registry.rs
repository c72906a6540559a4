//! Benchmark fixtures per calculator type.

use std::collections::HashMap;

use serde_json::json;
use thiserror::Error;

use super::{BenchmarkTest, CalculatorKind};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Fixture '{fixture}' has min > max for output '{output}'")]
    InvalidRange { fixture: String, output: String },
}

/// Endpoint-independent fixture table.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRegistry {
    fixtures: HashMap<CalculatorKind, Vec<BenchmarkTest>>,
}

impl BenchmarkRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the standard fixtures for every calculator.
    pub fn builtin() -> Self {
        let mut fixtures = HashMap::new();
        fixtures.insert(CalculatorKind::Beam, beam_fixtures());
        fixtures.insert(CalculatorKind::Column, column_fixtures());
        fixtures.insert(CalculatorKind::Foundation, foundation_fixtures());
        fixtures.insert(CalculatorKind::Slab, slab_fixtures());
        fixtures.insert(CalculatorKind::RetainingWall, retaining_wall_fixtures());
        Self { fixtures }
    }

    /// Fixtures for a calculator, in registration order.
    pub fn get(&self, kind: CalculatorKind) -> &[BenchmarkTest] {
        self.fixtures.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append a fixture; rejects ranges with `min > max`.
    pub fn register(&mut self, kind: CalculatorKind, test: BenchmarkTest) -> Result<(), RegistryError> {
        if let Some(output) = test.malformed_range() {
            return Err(RegistryError::InvalidRange {
                fixture: test.name.clone(),
                output: output.to_string(),
            });
        }
        self.fixtures.entry(kind).or_default().push(test);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_fixture(mut self, kind: CalculatorKind, test: BenchmarkTest) -> Result<Self, RegistryError> {
        self.register(kind, test)?;
        Ok(self)
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.values().map(Vec::len).sum()
    }
}

fn beam_fixtures() -> Vec<BenchmarkTest> {
    vec![
        BenchmarkTest::new(
            "Simply supported 6 m beam",
            json!({
                "span": 6, "deadLoad": 15, "liveLoad": 10, "beamWidth": 300,
                "concreteGrade": 30, "steelGrade": 420, "supportType": "simply_supported"
            }),
            &[
                ("maxMoment", 145.0, 161.0, "kN·m"),
                ("beamDepth", 300.0, 750.0, "mm"),
                ("requiredAs", 600.0, 1400.0, "mm²"),
            ],
        ),
        BenchmarkTest::new(
            "Cantilever 3 m beam",
            json!({
                "span": 3, "deadLoad": 10, "liveLoad": 5, "beamWidth": 300,
                "concreteGrade": 30, "steelGrade": 420, "supportType": "cantilever"
            }),
            &[
                ("maxMoment", 85.0, 95.0, "kN·m"),
                ("beamDepth", 300.0, 600.0, "mm"),
                ("requiredAs", 400.0, 1200.0, "mm²"),
            ],
        ),
        BenchmarkTest::new(
            "Long span 8 m beam",
            json!({
                "span": 8, "deadLoad": 20, "liveLoad": 12, "beamWidth": 350,
                "concreteGrade": 35, "steelGrade": 420, "supportType": "simply_supported"
            }),
            &[
                ("maxMoment", 330.0, 362.0, "kN·m"),
                ("beamDepth", 450.0, 1000.0, "mm"),
                ("requiredAs", 1200.0, 2600.0, "mm²"),
            ],
        ),
    ]
}

fn column_fixtures() -> Vec<BenchmarkTest> {
    vec![
        BenchmarkTest::new(
            "Square 400 mm column",
            json!({
                "axialLoad": 1500, "momentX": 50, "width": 400, "depth": 400,
                "height": 3.5, "concreteGrade": 30, "steelGrade": 420
            }),
            &[
                ("requiredAs", 1600.0, 4000.0, "mm²"),
                ("slendernessRatio", 20.0, 35.0, ""),
            ],
        ),
        BenchmarkTest::new(
            "Square 300 mm column",
            json!({
                "axialLoad": 800, "momentX": 20, "width": 300, "depth": 300,
                "height": 3.0, "concreteGrade": 25, "steelGrade": 420
            }),
            &[
                ("requiredAs", 900.0, 2500.0, "mm²"),
                ("slendernessRatio", 25.0, 40.0, ""),
            ],
        ),
    ]
}

fn foundation_fixtures() -> Vec<BenchmarkTest> {
    vec![
        BenchmarkTest::new(
            "Isolated footing 1000 kN",
            json!({
                "columnLoad": 1000, "bearingCapacity": 200, "columnWidth": 400,
                "concreteGrade": 25, "steelGrade": 420
            }),
            &[
                ("footingWidth", 2.0, 2.8, "m"),
                ("footingDepth", 300.0, 700.0, "mm"),
                ("bearingPressure", 120.0, 200.0, "kPa"),
            ],
        ),
        BenchmarkTest::new(
            "Isolated footing 600 kN",
            json!({
                "columnLoad": 600, "bearingCapacity": 150, "columnWidth": 300,
                "concreteGrade": 25, "steelGrade": 420
            }),
            &[
                ("footingWidth", 1.8, 2.5, "m"),
                ("footingDepth", 250.0, 600.0, "mm"),
                ("bearingPressure", 90.0, 150.0, "kPa"),
            ],
        ),
    ]
}

fn slab_fixtures() -> Vec<BenchmarkTest> {
    vec![
        BenchmarkTest::new(
            "Two-way slab 4x5 m",
            json!({
                "spanX": 4, "spanY": 5, "deadLoad": 5, "liveLoad": 3,
                "slabType": "two_way", "concreteGrade": 25
            }),
            &[
                ("thickness", 120.0, 200.0, "mm"),
                ("requiredAs", 200.0, 600.0, "mm²/m"),
            ],
        ),
        BenchmarkTest::new(
            "One-way slab 3.5 m",
            json!({
                "spanX": 3.5, "spanY": 8, "deadLoad": 4.5, "liveLoad": 2,
                "slabType": "one_way", "concreteGrade": 25
            }),
            &[("thickness", 130.0, 200.0, "mm")],
        ),
    ]
}

fn retaining_wall_fixtures() -> Vec<BenchmarkTest> {
    vec![BenchmarkTest::new(
        "Cantilever wall 4 m",
        json!({
            "wallHeight": 4, "soilUnitWeight": 18, "frictionAngle": 30,
            "surcharge": 10, "baseWidth": 2.8, "concreteGrade": 25
        }),
        &[
            ("fosOverturning", 1.5, 4.0, ""),
            ("fosSliding", 1.5, 3.0, ""),
            ("maxBearingPressure", 60.0, 200.0, "kPa"),
        ],
    )]
}
