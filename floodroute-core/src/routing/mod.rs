//! Route computation over the road graph

pub mod dijkstra;
mod route;
mod to_geojson;

pub use route::{
    RouteRequest, RouteResponse, RouteResult, RouteStatus, compute_route, route_between_nodes,
    route_request,
};
pub use to_geojson::routes_to_geojson;
