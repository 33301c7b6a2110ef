//! Flood-risk-aware road routing.
//!
//! The crate turns road elevation data and a rainfall intensity into per-road
//! flood risk, prices every road segment for a given vehicle class and finds
//! lowest-cost routes over a shared, read-only road graph.

pub mod algo;
pub mod cost;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod risk;
pub mod routing;

pub use algo::simulation::{
    SimulationOutcome, SimulationReport, SimulationRequest, SimulationRunner, SimulationSummary,
    simulate,
};
pub use cost::{FloodCostModel, ImpassablePolicy, edge_cost};
pub use error::Error;
pub use loading::{RoadModelConfig, build_road_graph, create_road_graph};
pub use model::{
    RoadClass, RoadEdge, RoadGraph, RoadNode, SharedRoadGraph, VehicleFleet, VehicleProfile,
};
pub use risk::{RiskLevel, RiskRecord, RoadElevation, compute_all_roads, compute_road_risk};
pub use routing::{RouteRequest, RouteResponse, RouteResult, RouteStatus, compute_route};

/// Node index in the road graph
pub type RoadNodeId = petgraph::graph::NodeIndex;

/// Traversal cost in seconds-equivalent units
pub type Cost = f64;

/// Decimal places used to quantize coordinates into node keys (~1 m)
pub const DEFAULT_NODE_PRECISION: u32 = 5;
