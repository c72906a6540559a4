//! Per-calculator compliance rules.

use serde_json::{Map, Value};

use super::standards::*;
use super::{flag, number, Severity, ValidationCheck};

type Fields = Map<String, Value>;

pub fn beam(inputs: &Fields, outputs: &Fields) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    let span = number(inputs, "span");
    let width = number(inputs, "beamWidth");
    let depth = number(outputs, "beamDepth");
    let required_as = number(outputs, "requiredAs");
    let provided_as = number(outputs, "providedAs");

    // Span is in meters, depth in millimeters.
    if let (Some(span), Some(depth)) = (span, depth) {
        if span > 0.0 && depth > 0.0 {
            let span_mm = span * 1000.0;
            let ratio = depth / span_mm;
            let passed = (BEAM_MIN_DEPTH_SPAN_RATIO..=BEAM_MAX_DEPTH_SPAN_RATIO).contains(&ratio);
            checks.push(ValidationCheck::evaluate(
                "Depth/Span Ratio",
                passed,
                Severity::Warning,
                format!(
                    "{:.0}-{:.0} mm (span/21 to span/8)",
                    span_mm * BEAM_MIN_DEPTH_SPAN_RATIO,
                    span_mm * BEAM_MAX_DEPTH_SPAN_RATIO
                ),
                format!("{:.0} mm (span/{:.1})", depth, span_mm / depth),
                REF_DEPTH_SPAN,
            ));
        } else {
            checks.push(ValidationCheck::evaluate(
                "Depth/Span Ratio",
                false,
                Severity::Warning,
                "positive depth and span".to_string(),
                format!("depth {} mm, span {} m", depth, span),
                REF_DEPTH_SPAN,
            ));
        }
    }

    if let (Some(required), Some(width), Some(depth)) = (required_as, width, depth) {
        if width > 0.0 && depth > 0.0 {
            let rho = required / (width * EFFECTIVE_DEPTH_FACTOR * depth);
            let passed = (BEAM_RHO_MIN..=BEAM_RHO_MAX).contains(&rho);
            checks.push(ValidationCheck::evaluate(
                "Reinforcement Ratio",
                passed,
                Severity::Critical,
                format!("{:.2}%-{:.2}%", BEAM_RHO_MIN * 100.0, BEAM_RHO_MAX * 100.0),
                format!("{:.3}%", rho * 100.0),
                REF_BEAM_RHO,
            ));
        }
    }

    if let (Some(required), Some(provided)) = (required_as, provided_as) {
        checks.push(ValidationCheck::evaluate(
            "Safety Margin (As)",
            provided >= required,
            Severity::Critical,
            format!("As,provided ≥ {:.0} mm²", required),
            format!("{:.0} mm²", provided),
            REF_SAFETY_MARGIN,
        ));
    }

    let dead = number(inputs, "deadLoad");
    let live = number(inputs, "liveLoad");
    let moment = number(outputs, "maxMoment");
    if let (Some(span), Some(dead), Some(live), Some(moment)) = (span, dead, live, moment) {
        let w = DEAD_LOAD_FACTOR * dead + LIVE_LOAD_FACTOR * live;
        let coeff = if is_cantilever(inputs) {
            CANTILEVER_MOMENT_COEFF
        } else {
            SIMPLE_SPAN_MOMENT_COEFF
        };
        let expected = w * span * span / coeff;
        if expected > 0.0 {
            let deviation = (moment - expected).abs() / expected;
            checks.push(ValidationCheck::evaluate(
                "Factored Moment",
                deviation < MOMENT_TOLERANCE,
                Severity::Warning,
                format!("{:.1} kN·m (wu = {:.1} kN/m, wL²/{})", expected, w, coeff),
                format!("{:.1} kN·m ({:.1}% deviation)", moment, deviation * 100.0),
                REF_LOAD_COMBINATION,
            ));
        }
    }

    checks
}

fn is_cantilever(inputs: &Fields) -> bool {
    inputs
        .get("supportType")
        .and_then(Value::as_str)
        .map(|s| s.eq_ignore_ascii_case("cantilever"))
        .unwrap_or(false)
}

pub fn column(inputs: &Fields, outputs: &Fields) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    let width = number(inputs, "width");
    let depth = number(inputs, "depth");

    if let (Some(width), Some(depth)) = (width, depth) {
        let min_dim = width.min(depth);
        checks.push(ValidationCheck::evaluate(
            "Minimum Column Dimension",
            min_dim >= COLUMN_MIN_DIMENSION_MM,
            Severity::Critical,
            format!("≥ {:.0} mm", COLUMN_MIN_DIMENSION_MM),
            format!("{:.0} mm", min_dim),
            REF_COLUMN_DIMENSION,
        ));
    }

    if let (Some(ratio), Some(is_slender)) =
        (number(outputs, "slendernessRatio"), flag(outputs, "isSlender"))
    {
        let should_be_slender = ratio > SLENDERNESS_LIMIT;
        checks.push(ValidationCheck::evaluate(
            "Slenderness Classification",
            should_be_slender == is_slender,
            Severity::Warning,
            format!(
                "{} (kLu/r = {:.1}, limit {:.0})",
                slender_label(should_be_slender),
                ratio,
                SLENDERNESS_LIMIT
            ),
            slender_label(is_slender).to_string(),
            REF_SLENDERNESS,
        ));
    }

    if let (Some(required), Some(width), Some(depth)) = (number(outputs, "requiredAs"), width, depth) {
        let gross = width * depth;
        if gross > 0.0 {
            let rho = required / gross;
            checks.push(ValidationCheck::evaluate(
                "Reinforcement Ratio",
                (COLUMN_RHO_MIN..=COLUMN_RHO_MAX).contains(&rho),
                Severity::Critical,
                format!("{:.0}%-{:.0}%", COLUMN_RHO_MIN * 100.0, COLUMN_RHO_MAX * 100.0),
                format!("{:.3}%", rho * 100.0),
                REF_COLUMN_RHO,
            ));
        }
    }

    checks
}

fn slender_label(slender: bool) -> &'static str {
    if slender {
        "slender"
    } else {
        "short"
    }
}

pub fn foundation(inputs: &Fields, outputs: &Fields) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    let capacity = number(inputs, "bearingCapacity").or_else(|| number(outputs, "bearingCapacity"));
    if let (Some(pressure), Some(capacity)) = (number(outputs, "bearingPressure"), capacity) {
        if capacity > 0.0 {
            let ratio = pressure / capacity;
            checks.push(ValidationCheck::evaluate(
                "Bearing Pressure",
                ratio <= MAX_BEARING_RATIO,
                Severity::Critical,
                format!("≤ {:.1} kPa (ratio ≤ {:.2})", capacity, MAX_BEARING_RATIO),
                format!("{:.1} kPa (ratio {:.3})", pressure, ratio),
                REF_BEARING,
            ));
        }
    }

    if let Some(footing_depth) = number(outputs, "footingDepth") {
        checks.push(ValidationCheck::evaluate(
            "Minimum Footing Depth",
            footing_depth >= MIN_FOOTING_DEPTH_MM,
            Severity::Warning,
            format!("≥ {:.0} mm", MIN_FOOTING_DEPTH_MM),
            format!("{:.0} mm", footing_depth),
            REF_FOOTING_DEPTH,
        ));
    }

    checks
}

// FOS_BEARING_MIN is not evaluated here.
pub fn retaining_wall(_inputs: &Fields, outputs: &Fields) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    if let Some(fos) = number(outputs, "fosOverturning") {
        checks.push(ValidationCheck::evaluate(
            "Overturning FOS",
            fos >= FOS_OVERTURNING_MIN,
            Severity::Critical,
            format!("≥ {:.1}", FOS_OVERTURNING_MIN),
            format!("{:.2}", fos),
            REF_WALL_STABILITY,
        ));
    }

    if let Some(fos) = number(outputs, "fosSliding") {
        checks.push(ValidationCheck::evaluate(
            "Sliding FOS",
            fos >= FOS_SLIDING_MIN,
            Severity::Critical,
            format!("≥ {:.1}", FOS_SLIDING_MIN),
            format!("{:.2}", fos),
            REF_WALL_STABILITY,
        ));
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    fn find<'a>(checks: &'a [ValidationCheck], name: &str) -> &'a ValidationCheck {
        checks
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("missing check {name}"))
    }

    fn beam_inputs() -> Fields {
        obj(json!({
            "span": 6, "deadLoad": 15, "liveLoad": 10, "beamWidth": 300,
            "supportType": "simply_supported"
        }))
    }

    #[test]
    fn test_beam_compliance_pass() {
        let outputs = obj(json!({"maxMoment": 115, "beamDepth": 500, "requiredAs": 600, "providedAs": 650}));
        let checks = beam(&beam_inputs(), &outputs);

        let rho = find(&checks, "Reinforcement Ratio");
        assert!(rho.passed);
        assert_eq!(rho.severity, Severity::Info);
        assert_eq!(rho.actual, "0.444%");

        let margin = find(&checks, "Safety Margin (As)");
        assert!(margin.passed);

        // 500 mm over 6 m is L/12.
        assert!(find(&checks, "Depth/Span Ratio").passed);
    }

    #[test]
    fn test_beam_zero_depth_fails_depth_span_check() {
        let outputs = obj(json!({"beamDepth": 0, "requiredAs": 600, "providedAs": 650}));
        let checks = beam(&beam_inputs(), &outputs);
        let ratio = find(&checks, "Depth/Span Ratio");
        assert!(!ratio.passed);
        assert_eq!(ratio.severity, Severity::Warning);
        assert_eq!(ratio.actual, "depth 0 mm, span 6 m");
        // ρ is undefined without a depth.
        assert!(checks.iter().all(|c| c.name != "Reinforcement Ratio"));
    }

    #[test]
    fn test_beam_moment_deviation_is_warning() {
        // wu = 34 kN/m, wL²/8 = 153 kN·m; 115 deviates ~24.8%.
        let outputs = obj(json!({"maxMoment": 115, "beamDepth": 500}));
        let m = find(&beam(&beam_inputs(), &outputs), "Factored Moment").clone();
        assert!(!m.passed);
        assert_eq!(m.severity, Severity::Warning);
        assert!(m.expected.starts_with("153.0 kN·m"));
    }

    #[test]
    fn test_beam_moment_within_tolerance_is_info() {
        let outputs = obj(json!({"maxMoment": 150}));
        let m = find(&beam(&beam_inputs(), &outputs), "Factored Moment").clone();
        assert!(m.passed);
        assert_eq!(m.severity, Severity::Info);
    }

    #[test]
    fn test_cantilever_uses_wl2_over_2() {
        let inputs = obj(json!({"span": 3, "deadLoad": 10, "liveLoad": 5, "supportType": "cantilever"}));
        let outputs = obj(json!({"maxMoment": 90}));
        let m = find(&beam(&inputs, &outputs), "Factored Moment").clone();
        assert!(m.passed);
        assert!(m.expected.starts_with("90.0 kN·m"));
    }

    #[test]
    fn test_beam_too_shallow_is_warning() {
        // L/30
        let outputs = obj(json!({"beamDepth": 200}));
        let c = find(&beam(&beam_inputs(), &outputs), "Depth/Span Ratio").clone();
        assert!(!c.passed);
        assert_eq!(c.severity, Severity::Warning);
    }

    #[test]
    fn test_beam_depth_span_boundaries_inclusive() {
        // 6000/8 = 750 exactly.
        let outputs = obj(json!({"beamDepth": 750}));
        assert!(find(&beam(&beam_inputs(), &outputs), "Depth/Span Ratio").passed);
        let outputs = obj(json!({"beamDepth": 751}));
        assert!(!find(&beam(&beam_inputs(), &outputs), "Depth/Span Ratio").passed);
    }

    #[test]
    fn test_beam_under_reinforced_is_critical() {
        let outputs = obj(json!({"beamDepth": 500, "requiredAs": 100}));
        let c = find(&beam(&beam_inputs(), &outputs), "Reinforcement Ratio").clone();
        assert!(!c.passed);
        assert_eq!(c.severity, Severity::Critical);
    }

    #[test]
    fn test_beam_insufficient_provided_steel_is_critical() {
        let outputs = obj(json!({"requiredAs": 980, "providedAs": 942}));
        let c = find(&beam(&beam_inputs(), &outputs), "Safety Margin (As)").clone();
        assert!(!c.passed);
        assert_eq!(c.severity, Severity::Critical);
    }

    #[test]
    fn test_beam_missing_values_omit_checks() {
        let checks = beam(&obj(json!({})), &obj(json!({"beamDepth": 500})));
        assert!(checks.is_empty());
    }

    #[test]
    fn test_column_slenderness_mismatch() {
        let inputs = obj(json!({"width": 400, "depth": 400}));
        let outputs = obj(json!({"slendernessRatio": 25, "isSlender": false}));
        let c = find(&column(&inputs, &outputs), "Slenderness Classification").clone();
        assert!(!c.passed);
        assert_eq!(c.severity, Severity::Warning);
        assert!(c.expected.starts_with("slender"));
        assert_eq!(c.actual, "short");
    }

    #[test]
    fn test_column_slenderness_at_limit_is_short() {
        let outputs = obj(json!({"slendernessRatio": 22, "isSlender": false}));
        let c = find(&column(&obj(json!({})), &outputs), "Slenderness Classification").clone();
        assert!(c.passed);
    }

    #[test]
    fn test_column_min_dimension() {
        let outputs = obj(json!({}));
        let c = find(&column(&obj(json!({"width": 180, "depth": 400})), &outputs), "Minimum Column Dimension").clone();
        assert!(!c.passed);
        assert_eq!(c.severity, Severity::Critical);
        assert!(find(&column(&obj(json!({"width": 200, "depth": 400})), &outputs), "Minimum Column Dimension").passed);
    }

    #[test]
    fn test_column_reinforcement_ratio_bounds() {
        let inputs = obj(json!({"width": 400, "depth": 400}));
        // 1% of 160000 mm²
        let ok = column(&inputs, &obj(json!({"requiredAs": 1600})));
        assert!(find(&ok, "Reinforcement Ratio").passed);
        let low = column(&inputs, &obj(json!({"requiredAs": 1500})));
        assert!(!find(&low, "Reinforcement Ratio").passed);
        let high = column(&inputs, &obj(json!({"requiredAs": 13000})));
        assert!(!find(&high, "Reinforcement Ratio").passed);
    }

    #[test]
    fn test_foundation_bearing_overload() {
        let inputs = obj(json!({"bearingCapacity": 150}));
        let outputs = obj(json!({"bearingPressure": 160, "footingDepth": 400}));
        let checks = foundation(&inputs, &outputs);
        let c = find(&checks, "Bearing Pressure");
        assert!(!c.passed);
        assert_eq!(c.severity, Severity::Critical);
        assert!(c.expected.contains("150.0"));
        assert!(c.actual.contains("160.0"));
        assert!(c.actual.contains("1.067"));
        assert!(find(&checks, "Minimum Footing Depth").passed);
    }

    #[test]
    fn test_foundation_capacity_falls_back_to_outputs() {
        let outputs = obj(json!({"bearingPressure": 100, "bearingCapacity": 200}));
        assert!(find(&foundation(&obj(json!({})), &outputs), "Bearing Pressure").passed);
    }

    #[test]
    fn test_foundation_thin_footing_is_warning() {
        let c = find(&foundation(&obj(json!({})), &obj(json!({"footingDepth": 120}))), "Minimum Footing Depth").clone();
        assert!(!c.passed);
        assert_eq!(c.severity, Severity::Warning);
    }

    #[test]
    fn test_wall_fos_thresholds() {
        let checks = retaining_wall(&obj(json!({})), &obj(json!({"fosOverturning": 1.5, "fosSliding": 1.2})));
        assert!(find(&checks, "Overturning FOS").passed);
        let sliding = find(&checks, "Sliding FOS");
        assert!(!sliding.passed);
        assert_eq!(sliding.severity, Severity::Critical);
    }

    /// Known gap: the bearing FOS (≥ 3.0) from the standards table is not
    /// evaluated for retaining walls.
    #[test]
    fn test_wall_bearing_fos_not_evaluated() {
        let outputs = obj(json!({"fosOverturning": 2.0, "fosSliding": 2.0, "fosBearing": 1.1}));
        let checks = retaining_wall(&obj(json!({})), &outputs);
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.passed));
        assert_eq!(FOS_BEARING_MIN, 3.0);
    }
}
