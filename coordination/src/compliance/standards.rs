//! ACI 318-19 derived thresholds.
//!
//! These constants define pass/fail boundaries; change them only together
//! with the tests that pin them.

/// Minimum beam depth as a fraction of span (L/21).
pub const BEAM_MIN_DEPTH_SPAN_RATIO: f64 = 1.0 / 21.0;
/// Maximum beam depth as a fraction of span (L/8).
pub const BEAM_MAX_DEPTH_SPAN_RATIO: f64 = 1.0 / 8.0;
/// Effective depth taken as 0.9 h.
pub const EFFECTIVE_DEPTH_FACTOR: f64 = 0.9;
pub const BEAM_RHO_MIN: f64 = 0.0018;
pub const BEAM_RHO_MAX: f64 = 0.04;

pub const DEAD_LOAD_FACTOR: f64 = 1.2;
pub const LIVE_LOAD_FACTOR: f64 = 1.6;
/// wL²/8 for simply supported spans.
pub const SIMPLE_SPAN_MOMENT_COEFF: f64 = 8.0;
/// wL²/2 for cantilevers.
pub const CANTILEVER_MOMENT_COEFF: f64 = 2.0;
/// Maximum relative deviation of the reported factored moment.
pub const MOMENT_TOLERANCE: f64 = 0.15;

pub const COLUMN_MIN_DIMENSION_MM: f64 = 200.0;
/// kLu/r above which a column is slender.
pub const SLENDERNESS_LIMIT: f64 = 22.0;
pub const COLUMN_RHO_MIN: f64 = 0.01;
pub const COLUMN_RHO_MAX: f64 = 0.08;

pub const MAX_BEARING_RATIO: f64 = 1.0;
pub const MIN_FOOTING_DEPTH_MM: f64 = 150.0;

pub const FOS_OVERTURNING_MIN: f64 = 1.5;
pub const FOS_SLIDING_MIN: f64 = 1.5;
/// Defined but not evaluated by the retaining wall rules.
pub const FOS_BEARING_MIN: f64 = 3.0;

pub const REF_DEPTH_SPAN: &str = "ACI 318-19 Table 9.3.1.1";
pub const REF_BEAM_RHO: &str = "ACI 318-19 §9.6.1.2 / §21.2.2";
pub const REF_SAFETY_MARGIN: &str = "ACI 318-19 §9.5.1.1";
pub const REF_LOAD_COMBINATION: &str = "ACI 318-19 §5.3.1";
pub const REF_COLUMN_DIMENSION: &str = "ACI 318-19 §10.3.1";
pub const REF_SLENDERNESS: &str = "ACI 318-19 §6.2.5";
pub const REF_COLUMN_RHO: &str = "ACI 318-19 §10.6.1.1";
pub const REF_BEARING: &str = "ACI 318-19 §13.3.1.1";
pub const REF_FOOTING_DEPTH: &str = "ACI 318-19 §13.3.1.2";
pub const REF_WALL_STABILITY: &str = "ACI 318-19 §13.3.7 (geotechnical FOS)";
