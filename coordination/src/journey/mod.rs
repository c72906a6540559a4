//! User-journey simulation: personas, journeys and the step simulator.

pub mod catalog;
pub mod simulator;

pub use catalog::{
    Catalog, CatalogError, Expertise, Journey, JourneyStep, Patience, UserPersona,
};
pub use simulator::{
    classify, speed_adjustment, ux_score, JourneyResult, JourneySimulator, JourneyStatus,
    SimulatorConfig, StepOutcome, StepStatus, ABANDONMENT_MESSAGE,
};
