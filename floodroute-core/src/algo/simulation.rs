//! Batch simulation of many independent vehicle trips over one shared graph.
//!
//! The trial plan (vehicle type, origin, destination) is drawn up front from
//! a seeded RNG, then every trial is routed in parallel. Results are
//! collected by trial id, so the output does not depend on scheduling.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use itertools::Itertools;
use log::info;
use petgraph::graph::NodeIndex;
use rand::SeedableRng;
use rand::seq::{SliceRandom, index};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cost::{FloodCostModel, ImpassablePolicy};
use crate::model::{VehicleFleet, VehicleProfile};
use crate::routing::{RouteStatus, route_between_nodes};
use crate::{Cost, Error, RoadGraph};

/// Seed used when a simulation does not ask for one
pub const DEFAULT_SEED: u64 = 42;

/// Simulation request as sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub vehicle_count: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Restrict the vehicle pool to these types; every fleet profile if absent
    #[serde(default)]
    pub vehicle_types: Option<Vec<String>>,
}

impl SimulationRequest {
    /// Run the request over every node of `graph`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown vehicle types, a graph with fewer than
    /// two nodes, or a cancelled run.
    pub fn run(
        &self,
        graph: &RoadGraph,
        fleet: &VehicleFleet,
        policy: ImpassablePolicy,
        cancel: Option<&AtomicBool>,
    ) -> Result<SimulationReport, Error> {
        let mut runner = SimulationRunner::for_fleet(graph, fleet, self.vehicle_types.as_deref())?
            .with_policy(policy)
            .with_seed(self.seed.unwrap_or(DEFAULT_SEED));
        if let Some(flag) = cancel {
            runner = runner.with_cancel_flag(flag);
        }
        let nodes: Vec<NodeIndex> = graph.node_indices().collect();
        runner.run(&nodes, self.vehicle_count).map(SimulationReport::from)
    }
}

/// Outcome of one simulated trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub trial_id: usize,
    pub vehicle_type: String,
    pub status: RouteStatus,
    /// Origin node index
    pub origin: usize,
    /// Destination node index
    pub destination: usize,
    pub origin_coord: [f64; 2],
    pub destination_coord: [f64; 2],
    /// `[lon, lat]` path, empty when blocked
    pub path: Vec<[f64; 2]>,
    /// `null` when blocked
    pub total_cost: Option<Cost>,
}

/// Per vehicle type tallies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleTally {
    pub trips: usize,
    pub succeeded: usize,
    pub stranded: usize,
    /// Mean cost of the successful trips
    pub mean_cost: Option<Cost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub trips: usize,
    pub stranded: usize,
    pub by_vehicle: BTreeMap<String, VehicleTally>,
}

impl SimulationSummary {
    #[allow(clippy::cast_precision_loss)]
    pub fn from_outcomes(outcomes: &[SimulationOutcome]) -> Self {
        let mut by_vehicle: BTreeMap<String, VehicleTally> = BTreeMap::new();
        let mut cost_sums: BTreeMap<&str, Cost> = BTreeMap::new();

        for outcome in outcomes {
            let tally = by_vehicle.entry(outcome.vehicle_type.clone()).or_default();
            tally.trips += 1;
            match (outcome.status, outcome.total_cost) {
                (RouteStatus::Success, Some(cost)) => {
                    tally.succeeded += 1;
                    *cost_sums.entry(outcome.vehicle_type.as_str()).or_default() += cost;
                }
                _ => tally.stranded += 1,
            }
        }

        for (vehicle, tally) in &mut by_vehicle {
            if tally.succeeded > 0 {
                let sum = cost_sums.get(vehicle.as_str()).copied().unwrap_or_default();
                tally.mean_cost = Some(sum / tally.succeeded as f64);
            }
        }

        Self {
            trips: outcomes.len(),
            stranded: by_vehicle.values().map(|t| t.stranded).sum(),
            by_vehicle,
        }
    }
}

/// Ordered outcomes together with their summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub outcomes: Vec<SimulationOutcome>,
    pub summary: SimulationSummary,
}

impl From<Vec<SimulationOutcome>> for SimulationReport {
    fn from(outcomes: Vec<SimulationOutcome>) -> Self {
        let summary = SimulationSummary::from_outcomes(&outcomes);
        Self { outcomes, summary }
    }
}

#[derive(Debug, Clone, Copy)]
struct Trial<'a> {
    id: usize,
    profile: &'a VehicleProfile,
    origin: NodeIndex,
    destination: NodeIndex,
}

/// Drives many independent route computations against one read-only graph
#[derive(Debug, Clone)]
pub struct SimulationRunner<'a> {
    graph: &'a RoadGraph,
    pool: Vec<&'a VehicleProfile>,
    policy: ImpassablePolicy,
    seed: u64,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> SimulationRunner<'a> {
    /// # Errors
    ///
    /// Returns an error if the vehicle pool is empty.
    pub fn new(graph: &'a RoadGraph, pool: Vec<&'a VehicleProfile>) -> Result<Self, Error> {
        if pool.is_empty() {
            return Err(Error::InvalidData(
                "Simulation needs at least one vehicle type".to_string(),
            ));
        }
        Ok(Self {
            graph,
            pool,
            policy: ImpassablePolicy::default(),
            seed: DEFAULT_SEED,
            cancel: None,
        })
    }

    /// Runner over every profile of the fleet, or the named subset
    ///
    /// # Errors
    ///
    /// Returns an error if a named vehicle type is not in the fleet.
    pub fn for_fleet(
        graph: &'a RoadGraph,
        fleet: &'a VehicleFleet,
        vehicle_types: Option<&[String]>,
    ) -> Result<Self, Error> {
        let pool = match vehicle_types {
            Some(names) => names
                .iter()
                .map(|name| fleet.get(name))
                .collect::<Result<Vec<_>, _>>()?,
            None => fleet.profiles().iter().collect(),
        };
        Self::new(graph, pool)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ImpassablePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Abort the run once `flag` is set. Trials already in flight finish
    /// but their results are discarded.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn plan(&self, node_population: &[NodeIndex], n_requests: usize) -> Vec<Trial<'a>> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..n_requests)
            .filter_map(|id| {
                let profile = *self.pool.choose(&mut rng)?;
                let picked = index::sample(&mut rng, node_population.len(), 2);
                Some(Trial {
                    id,
                    profile,
                    origin: node_population[picked.index(0)],
                    destination: node_population[picked.index(1)],
                })
            })
            .collect()
    }

    fn run_trial(&self, trial: &Trial<'_>) -> SimulationOutcome {
        let cost_model = FloodCostModel::new(trial.profile, self.policy);
        let route = route_between_nodes(self.graph, trial.origin, trial.destination, &cost_model);
        let coord = |node: NodeIndex| {
            self.graph
                .node_position(node)
                .map_or([f64::NAN, f64::NAN], |p| [p.x(), p.y()])
        };

        SimulationOutcome {
            trial_id: trial.id,
            vehicle_type: trial.profile.name.clone(),
            status: route.status,
            origin: trial.origin.index(),
            destination: trial.destination.index(),
            origin_coord: coord(trial.origin),
            destination_coord: coord(trial.destination),
            total_cost: route.total_cost.is_finite().then_some(route.total_cost),
            path: route.path,
        }
    }

    /// Run `n_requests` trials between distinct random nodes of
    /// `node_population`.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two distinct nodes are available, a
    /// node does not exist in the graph, or the run was cancelled.
    pub fn run(
        &self,
        node_population: &[NodeIndex],
        n_requests: usize,
    ) -> Result<Vec<SimulationOutcome>, Error> {
        // first occurrence order keeps the plan stable for a given input
        let nodes: Vec<NodeIndex> = node_population.iter().copied().unique().collect();
        if nodes.len() < 2 {
            return Err(Error::InvalidData(format!(
                "Simulation needs at least 2 distinct nodes, got {}",
                nodes.len()
            )));
        }
        if nodes
            .iter()
            .any(|node| node.index() >= self.graph.node_count())
        {
            return Err(Error::InvalidNodeIndex);
        }

        let trials = self.plan(&nodes, n_requests);
        let outcomes = trials
            .par_iter()
            .map(|trial| {
                if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    return None;
                }
                Some(self.run_trial(trial))
            })
            .collect::<Option<Vec<_>>>();

        let cancelled = self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));
        let outcomes = match outcomes {
            Some(outcomes) if !cancelled => outcomes,
            _ => return Err(Error::Cancelled),
        };

        let stranded = outcomes
            .iter()
            .filter(|o| o.status == RouteStatus::Blocked)
            .count();
        info!(
            "Simulated {} trips: {} stranded",
            outcomes.len(),
            stranded
        );
        Ok(outcomes)
    }
}

/// Simulate `n_requests` trips between nodes of `node_population` with the
/// default seed and policy.
///
/// # Errors
///
/// See [`SimulationRunner::run`].
pub fn simulate(
    graph: &RoadGraph,
    node_population: &[NodeIndex],
    vehicle_type_pool: &[&VehicleProfile],
    n_requests: usize,
) -> Result<Vec<SimulationOutcome>, Error> {
    SimulationRunner::new(graph, vehicle_type_pool.to_vec())?.run(node_population, n_requests)
}
