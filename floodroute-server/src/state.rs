use std::sync::Arc;

use floodroute_core::{RoadGraph, SharedRoadGraph, VehicleFleet};
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<SharedRoadGraph>,
    pub fleet: Arc<VehicleFleet>,
    pub config: Arc<ServerConfig>,
    /// Held while a new graph is being built so rebuilds do not interleave
    pub rebuild: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(graph: RoadGraph, fleet: VehicleFleet, config: ServerConfig) -> Self {
        Self {
            graph: Arc::new(SharedRoadGraph::new(graph)),
            fleet: Arc::new(fleet),
            config: Arc::new(config),
            rebuild: Arc::new(Mutex::new(())),
        }
    }
}
