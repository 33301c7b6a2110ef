//! Road network model

pub mod components;
pub mod network;
pub mod shared;

pub use components::{NodeKey, RoadEdge, RoadNode};
pub use network::{IndexedPoint, RoadGraph, RoadGraphBuilder, RoadGraphMeta};
pub use shared::SharedRoadGraph;
