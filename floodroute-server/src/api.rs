//! HTTP routes: health, road risk, single routes, simulations and rainfall
//! updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use floodroute_core::{
    RiskRecord, RouteRequest, RouteResponse, SimulationReport, SimulationRequest,
    compute_all_roads, create_road_graph, routing::route_request,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let limits = state.config.limits.clone();
    let routes = Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route("/api/roads_risk", get(roads_risk).post(roads_risk_body))
        .route("/api/route", post(route))
        .route("/api/simulate", post(simulate))
        .route("/api/rainfall", post(rainfall))
        .with_state(state);
    with_limits(
        routes,
        Duration::from_secs(limits.request_timeout_secs),
        limits.concurrency_limit,
    )
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}

/// Timeout and concurrency limit; layer errors become JSON responses
fn with_limits(routes: Router, timeout: Duration, concurrency_limit: usize) -> Router {
    routes.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_layer_error))
            .timeout(timeout)
            .concurrency_limit(concurrency_limit),
    )
}

async fn handle_layer_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "request timed out" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
    }
}

fn checked_rain(rain_mm: f64) -> Result<f64, ApiError> {
    if rain_mm.is_finite() && rain_mm >= 0.0 {
        Ok(rain_mm)
    } else {
        Err(ApiError::BadRequest(format!(
            "rain_mm must be a non-negative number, got {rain_mm}"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct RiskParams {
    rain_mm: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RiskResponse {
    rain_mm: f64,
    roads: Vec<RiskRecord>,
}

/// Risk of every road; defaults to the rainfall of the current graph
async fn assess_risk(state: &AppState, rain_mm: Option<f64>) -> Result<RiskResponse, ApiError> {
    let rain_mm =
        checked_rain(rain_mm.unwrap_or_else(|| state.graph.snapshot().meta().rain_mm))?;
    let path = state.config.model.risk_path.clone();
    let roads = tokio::task::spawn_blocking(move || compute_all_roads(&path, rain_mm)).await??;
    Ok(RiskResponse { rain_mm, roads })
}

async fn roads_risk(
    State(state): State<AppState>,
    Query(params): Query<RiskParams>,
) -> Result<Json<RiskResponse>, ApiError> {
    Ok(Json(assess_risk(&state, params.rain_mm).await?))
}

/// Same as `GET`, with the rainfall in an optional JSON body
async fn roads_risk_body(
    State(state): State<AppState>,
    params: Option<Json<RiskParams>>,
) -> Result<Json<RiskResponse>, ApiError> {
    let rain_mm = params.and_then(|Json(params)| params.rain_mm);
    Ok(Json(assess_risk(&state, rain_mm).await?))
}

async fn route(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let graph = state.graph.snapshot();
    let fleet = Arc::clone(&state.fleet);
    let policy = state.config.model.impassable_policy;
    let result =
        tokio::task::spawn_blocking(move || route_request(&graph, &fleet, &request, policy))
            .await??;
    Ok(Json(result.to_response()))
}

#[derive(Debug, Deserialize)]
struct SimulateParams {
    vehicle_count: Option<usize>,
    seed: Option<u64>,
    vehicle_types: Option<Vec<String>>,
}

/// Flags the run as cancelled when the handler is dropped, e.g. on timeout
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

async fn simulate(
    State(state): State<AppState>,
    Json(params): Json<SimulateParams>,
) -> Result<Json<SimulationReport>, ApiError> {
    let settings = &state.config.simulation;
    let vehicle_count = params
        .vehicle_count
        .unwrap_or(settings.default_vehicle_count);
    if vehicle_count > settings.max_vehicle_count {
        return Err(ApiError::BadRequest(format!(
            "vehicle_count {vehicle_count} exceeds the maximum of {}",
            settings.max_vehicle_count
        )));
    }

    let request = SimulationRequest {
        vehicle_count,
        seed: params.seed.or(settings.seed),
        vehicle_types: params.vehicle_types,
    };
    let graph = state.graph.snapshot();
    let fleet = Arc::clone(&state.fleet);
    let policy = state.config.model.impassable_policy;
    let cancel = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(Arc::clone(&cancel));

    let report = tokio::task::spawn_blocking(move || {
        request.run(&graph, &fleet, policy, Some(cancel.as_ref()))
    })
    .await??;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct RainfallParams {
    rain_mm: f64,
}

/// Rebuild the graph for a new rainfall intensity and swap it in.
///
/// Requests already running keep the graph they started with.
async fn rainfall(
    State(state): State<AppState>,
    Json(params): Json<RainfallParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rain_mm = checked_rain(params.rain_mm)?;
    let config = state.config.model.clone().with_rain(rain_mm);

    let _rebuilding = state.rebuild.lock().await;
    let graph = tokio::task::spawn_blocking(move || create_road_graph(&config)).await??;
    let (nodes, edges) = (graph.node_count(), graph.edge_count());
    state.graph.replace(graph);
    info!("Rainfall set to {rain_mm} mm/hr: {nodes} nodes, {edges} edges");

    Ok(Json(json!({
        "rain_mm": rain_mm,
        "nodes": nodes,
        "edges": edges,
    })))
}
