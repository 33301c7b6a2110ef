pub use crate::DEFAULT_NODE_PRECISION;

// Re-export key components
pub use crate::algo::simulation::{
    SimulationOutcome, SimulationReport, SimulationRequest, SimulationRunner, SimulationSummary,
    simulate,
};
pub use crate::cost::{FloodCostModel, ImpassablePolicy, edge_cost};
pub use crate::loading::{RoadModelConfig, build_road_graph, create_road_graph};
pub use crate::model::{RoadClass, RoadGraph, SharedRoadGraph, VehicleFleet, VehicleProfile};
pub use crate::risk::{RiskLevel, RiskRecord, compute_all_roads, compute_road_risk};
pub use crate::routing::{
    RouteRequest, RouteResponse, RouteResult, RouteStatus, compute_route, route_between_nodes,
    route_request,
};

// Core types for the road network
pub use crate::Cost; // seconds-equivalent
pub use crate::RoadNodeId;
pub use crate::error::Error;
