//! Lowest-cost routes for one vehicle between two points

use geo::Point;
use log::debug;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use super::dijkstra::shortest_path;
use crate::cost::{FloodCostModel, ImpassablePolicy};
use crate::model::VehicleFleet;
use crate::{Cost, Error, RoadGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Success,
    /// No path exists between the endpoints
    Blocked,
}

/// Outcome of one route computation.
///
/// A blocked result has no nodes and an infinite cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub status: RouteStatus,
    pub vehicle_type: String,
    pub nodes: Vec<NodeIndex>,
    /// `[lon, lat]` of every node on the path
    pub path: Vec<[f64; 2]>,
    pub total_cost: Cost,
    /// Distance in meters from the requested origin to its snapped node
    pub origin_snap_m: Option<f64>,
    /// Distance in meters from the requested destination to its snapped node
    pub destination_snap_m: Option<f64>,
}

impl RouteResult {
    pub fn blocked(vehicle_type: impl Into<String>) -> Self {
        Self {
            status: RouteStatus::Blocked,
            vehicle_type: vehicle_type.into(),
            nodes: Vec::new(),
            path: Vec::new(),
            total_cost: f64::INFINITY,
            origin_snap_m: None,
            destination_snap_m: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RouteStatus::Success
    }

    pub fn to_response(&self) -> RouteResponse {
        RouteResponse {
            path: self.path.clone(),
            vehicle_type: self.vehicle_type.clone(),
            status: self.status,
            total_cost: self.total_cost.is_finite().then_some(self.total_cost),
        }
    }
}

/// Route request as sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// `[lon, lat]`
    pub origin: [f64; 2],
    /// `[lon, lat]`
    pub destination: [f64; 2],
    pub vehicle_type: String,
}

/// Route response as returned to clients.
///
/// `total_cost` is `null` for blocked routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub path: Vec<[f64; 2]>,
    pub vehicle_type: String,
    pub status: RouteStatus,
    pub total_cost: Option<Cost>,
}

fn validate_position(what: &str, [lon, lat]: [f64; 2]) -> Result<Point<f64>, Error> {
    if !(lon.is_finite() && lat.is_finite()) {
        return Err(Error::InvalidRequest(format!(
            "{what} coordinates must be finite numbers"
        )));
    }
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidRequest(format!(
            "{what} [{lon}, {lat}] is outside the valid longitude/latitude range"
        )));
    }
    Ok(Point::new(lon, lat))
}

/// Validate a client request and compute its route.
///
/// # Errors
///
/// Returns an error for an unknown vehicle type or invalid coordinates.
/// An unreachable destination is not an error but a blocked result.
pub fn route_request(
    graph: &RoadGraph,
    fleet: &VehicleFleet,
    request: &RouteRequest,
    policy: ImpassablePolicy,
) -> Result<RouteResult, Error> {
    let origin = validate_position("Origin", request.origin)?;
    let destination = validate_position("Destination", request.destination)?;
    let profile = fleet.get(&request.vehicle_type)?;

    let cost_model = FloodCostModel::new(profile, policy);
    Ok(compute_route(graph, &origin, &destination, &cost_model))
}

/// Compute the lowest-cost route between two geographic points.
///
/// Both points are snapped to their nearest graph node first.
pub fn compute_route(
    graph: &RoadGraph,
    origin: &Point<f64>,
    destination: &Point<f64>,
    cost_model: &FloodCostModel<'_>,
) -> RouteResult {
    let vehicle_type = &cost_model.profile().name;
    let (Some((origin_node, origin_snap)), Some((destination_node, destination_snap))) =
        (graph.nearest_node(origin), graph.nearest_node(destination))
    else {
        debug!("No graph nodes to snap to - route for {vehicle_type} is blocked");
        return RouteResult::blocked(vehicle_type.as_str());
    };

    let mut result = route_between_nodes(graph, origin_node, destination_node, cost_model);
    if result.is_success() {
        result.origin_snap_m = Some(origin_snap);
        result.destination_snap_m = Some(destination_snap);
    }
    result
}

/// Compute the lowest-cost route between two graph nodes
pub fn route_between_nodes(
    graph: &RoadGraph,
    origin: NodeIndex,
    destination: NodeIndex,
    cost_model: &FloodCostModel<'_>,
) -> RouteResult {
    let vehicle_type = cost_model.profile().name.as_str();
    let weight = |edge: &crate::model::RoadEdge| cost_model.cost(edge);

    let Some(found) = shortest_path(graph, origin, destination, weight) else {
        debug!(
            "No path for {vehicle_type} from node {} to node {}",
            origin.index(),
            destination.index()
        );
        return RouteResult::blocked(vehicle_type);
    };

    // Recompute the cost from the path itself, picking the cheapest
    // parallel edge for every hop
    let total_cost = graph.path_cost(&found.nodes, weight).unwrap_or(found.cost);
    debug_assert!((total_cost - found.cost).abs() <= 1e-6 * found.cost.max(1.0));

    let path = found
        .nodes
        .iter()
        .filter_map(|&node| graph.node_position(node))
        .map(|p| [p.x(), p.y()])
        .collect();

    debug!(
        "Route for {vehicle_type}: {} nodes, cost {total_cost:.1}",
        found.nodes.len()
    );

    RouteResult {
        status: RouteStatus::Success,
        vehicle_type: vehicle_type.to_string(),
        nodes: found.nodes,
        path,
        total_cost,
        origin_snap_m: None,
        destination_snap_m: None,
    }
}
