//! This module reads road geometry and elevation snapshots and builds the
//! flood-aware road graph from them.

mod builder;
mod config;
pub mod geometry;

pub use builder::{build_road_graph, create_road_graph};
pub use config::{MAX_NODE_PRECISION, RoadModelConfig};
pub use geometry::{RoadFeature, parse_road_features, read_road_features};
