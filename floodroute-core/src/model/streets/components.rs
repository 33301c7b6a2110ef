//! Road network components - nodes, edges and node keys

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::model::RoadClass;
use crate::risk::RiskLevel;

/// Coordinate quantized to a fixed number of decimal degrees.
///
/// Endpoints of different road geometries that round to the same key are
/// merged into a single graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    lon: i64,
    lat: i64,
}

impl NodeKey {
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantize(lon: f64, lat: f64, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        Self {
            lon: (lon * scale).round() as i64,
            lat: (lat * scale).round() as i64,
        }
    }
}

/// Road graph node
#[derive(Debug, Clone)]
pub struct RoadNode {
    pub key: NodeKey,
    /// Position of the first vertex that produced this key (lon, lat)
    pub geometry: Point<f64>,
}

/// Road graph edge: one atomic stretch of road between two vertices.
///
/// Missing attributes fall back to a 100 m residential segment without
/// standing water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadEdge {
    /// Identifier of the road (way) this segment belongs to
    pub road_id: String,
    /// Length in meters
    pub length: f64,
    pub road_class: RoadClass,
    /// Standing water depth in meters
    pub flood_depth: f64,
    pub risk: f64,
    pub level: RiskLevel,
    pub avg_elevation: Option<f64>,
    pub min_elev: Option<f64>,
    pub max_elev: Option<f64>,
}

impl Default for RoadEdge {
    fn default() -> Self {
        Self {
            road_id: String::new(),
            length: 100.0,
            road_class: RoadClass::Residential,
            flood_depth: 0.0,
            risk: 0.0,
            level: RiskLevel::Low,
            avg_elevation: None,
            min_elev: None,
            max_elev: None,
        }
    }
}

impl RoadEdge {
    pub fn new(road_id: impl Into<String>, length: f64, road_class: RoadClass) -> Self {
        Self {
            road_id: road_id.into(),
            length,
            road_class,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_flood_depth(mut self, flood_depth: f64) -> Self {
        self.flood_depth = flood_depth;
        self
    }
}
