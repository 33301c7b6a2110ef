//! Bulk algorithms built on top of single routes

pub mod simulation;

pub use simulation::{
    DEFAULT_SEED, SimulationOutcome, SimulationReport, SimulationRequest, SimulationRunner,
    SimulationSummary, VehicleTally, simulate,
};
