//! Data model for flood-aware road routing
//!
//! Contains the road network and the vehicle classes routed over it.

pub mod streets;
pub mod vehicle;

pub use streets::{
    NodeKey, RoadEdge, RoadGraph, RoadGraphBuilder, RoadGraphMeta, RoadNode, SharedRoadGraph,
};
pub use vehicle::{RoadClass, VehicleFleet, VehicleProfile};
