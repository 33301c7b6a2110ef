//! Swappable handle to the current road graph

use std::sync::{Arc, PoisonError, RwLock};

use super::network::RoadGraph;

/// Holds the road graph routing sessions run against.
///
/// Readers take an [`Arc`] snapshot and route on it without holding the
/// lock. A rebuilt graph (e.g. for a new rainfall intensity) replaces the
/// whole snapshot, so a search that is already running keeps seeing the
/// flood depths it started with.
#[derive(Debug)]
pub struct SharedRoadGraph {
    current: RwLock<Arc<RoadGraph>>,
}

impl SharedRoadGraph {
    pub fn new(graph: RoadGraph) -> Self {
        Self {
            current: RwLock::new(Arc::new(graph)),
        }
    }

    /// Current graph snapshot
    pub fn snapshot(&self) -> Arc<RoadGraph> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a new graph, returning the previous snapshot
    pub fn replace(&self, graph: RoadGraph) -> Arc<RoadGraph> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(graph))
    }
}
