use std::path::PathBuf;

use floodroute_core::prelude::*;
use geo::Point;

const ROADS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"osmid": "main", "highway": "residential"},
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.001, 0.0], [0.002, 0.0]]}
        },
        {
            "type": "Feature",
            "properties": {"osmid": "bypass", "highway": "primary"},
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.001, 0.001], [0.002, 0.0]]}
        },
        {
            "type": "Feature",
            "properties": {"osmid": "island", "highway": "secondary"},
            "geometry": {"type": "LineString", "coordinates": [[0.01, 0.01], [0.011, 0.01]]}
        },
        {
            "type": "Feature",
            "properties": {"osmid": "stub"},
            "geometry": {"type": "LineString", "coordinates": [[0.02, 0.02]]}
        }
    ]
}"#;

// main lies at the bottom of its range, bypass at the top
const SNAPSHOT: &str = r#"[
    {"id": "main", "length": 222.0, "min_elev": 900.0, "max_elev": 901.0, "avg_elevation": 900.0},
    {"id": "bypass", "length": 314.0, "min_elev": 900.0, "max_elev": 910.0, "avg_elev": 910.0}
]"#;

struct Fixture {
    roads: PathBuf,
    risk: PathBuf,
}

impl Fixture {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "floodroute-it-{}-{name}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let roads = dir.join("roads.geojson");
        let risk = dir.join("risk.json");
        std::fs::write(&roads, ROADS).unwrap();
        std::fs::write(&risk, SNAPSHOT).unwrap();
        Self { roads, risk }
    }

    fn config(&self, rain_mm: f64) -> RoadModelConfig {
        RoadModelConfig::new(&self.roads, &self.risk).with_rain(rain_mm)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(dir) = self.roads.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

fn route(graph: &RoadGraph, profile: &VehicleProfile, policy: ImpassablePolicy) -> RouteResult {
    compute_route(
        graph,
        &Point::new(0.0, 0.0),
        &Point::new(0.002, 0.0),
        &FloodCostModel::new(profile, policy),
    )
}

#[test]
fn graph_is_built_from_files() {
    let fixture = Fixture::new("build");
    let graph = create_road_graph(&fixture.config(50.0)).unwrap();

    // main and bypass share both ends, the stub is dropped
    assert_eq!(graph.node_count(), 6);
    assert_eq!(graph.edge_count(), 5);
    assert_eq!(graph.meta().rain_mm, 50.0);
}

#[test]
fn routes_are_valid_paths_with_matching_cost() {
    let fixture = Fixture::new("paths");
    let graph = create_road_graph(&fixture.config(20.0)).unwrap();
    let fleet = VehicleFleet::default();

    for profile in fleet.profiles() {
        let result = route(&graph, profile, ImpassablePolicy::Degrade);
        assert_eq!(result.status, RouteStatus::Success);
        assert!(result.nodes.len() >= 2);
        assert_eq!(result.path.first(), Some(&[0.0, 0.0]));
        assert_eq!(result.path.last(), Some(&[0.002, 0.0]));

        let mut expected = 0.0;
        for pair in result.nodes.windows(2) {
            expected += graph
                .edges_between(pair[0], pair[1])
                .map(|edge| edge_cost(edge, profile))
                .fold(f64::INFINITY, f64::min);
        }
        assert!(expected.is_finite());
        assert!((result.total_cost - expected).abs() < 1e-6);
    }
}

#[test]
fn disconnected_road_is_blocked() {
    let fixture = Fixture::new("blocked");
    let graph = create_road_graph(&fixture.config(50.0)).unwrap();
    let car = VehicleProfile::car();

    let result = compute_route(
        &graph,
        &Point::new(0.0, 0.0),
        &Point::new(0.011, 0.01),
        &FloodCostModel::new(&car, ImpassablePolicy::Degrade),
    );
    assert_eq!(result.status, RouteStatus::Blocked);
    assert_eq!(result.total_cost, f64::INFINITY);

    let json = serde_json::to_value(result.to_response()).unwrap();
    assert!(json["total_cost"].is_null());
    assert_eq!(json["status"], "blocked");
}

#[test]
fn block_policy_strands_vehicles_by_flood_depth() {
    let fixture = Fixture::new("policy");
    // risk is ~1.0 on main and ~0.74 on bypass: 0.50 m and 0.37 m of water
    let graph = create_road_graph(&fixture.config(50.0)).unwrap();

    let suv = VehicleProfile::suv();
    let car = VehicleProfile::car();
    let bike = VehicleProfile::bike();

    assert!(route(&graph, &suv, ImpassablePolicy::Block).is_success());
    assert_eq!(route(&graph, &car, ImpassablePolicy::Block).status, RouteStatus::Blocked);
    assert_eq!(route(&graph, &bike, ImpassablePolicy::Block).status, RouteStatus::Blocked);

    // degraded speed still gets everyone through
    for profile in [&suv, &car, &bike] {
        assert!(route(&graph, profile, ImpassablePolicy::Degrade).is_success());
    }
}

#[test]
fn dry_weather_has_no_risk() {
    let fixture = Fixture::new("dry");
    let records = compute_all_roads(&fixture.risk, 0.0).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.risk == 0.0 && r.level == RiskLevel::Low));

    let graph = create_road_graph(&fixture.config(0.0)).unwrap();
    for node in graph.node_indices() {
        assert!(graph.neighbors(node).all(|(_, edge)| edge.flood_depth == 0.0));
    }
}

#[test]
fn risk_is_recomputed_for_each_rainfall() {
    let fixture = Fixture::new("risk");
    let light = compute_all_roads(&fixture.risk, 10.0).unwrap();
    let heavy = compute_all_roads(&fixture.risk, 50.0).unwrap();
    for (l, h) in light.iter().zip(&heavy) {
        assert_eq!(l.id, h.id);
        assert!(l.risk <= h.risk);
    }
    assert_eq!(heavy[0].level, RiskLevel::VeryHigh);
    assert_eq!(heavy[0].risk, 1.0);
}

#[test]
fn simulation_is_reproducible_and_counts_stranded() {
    let fixture = Fixture::new("simulate");
    let graph = create_road_graph(&fixture.config(30.0)).unwrap();
    let fleet = VehicleFleet::default();
    let nodes: Vec<_> = graph.node_indices().collect();

    let run = |seed| {
        SimulationRunner::for_fleet(&graph, &fleet, None)
            .unwrap()
            .with_seed(seed)
            .run(&nodes, 100)
            .unwrap()
    };
    let first = run(11);
    assert_eq!(first, run(11));

    let report = SimulationReport::from(first);
    assert_eq!(report.summary.trips, 100);
    // only trips between the island and the rest are stranded
    for outcome in &report.outcomes {
        let island = |idx: usize| idx >= 4;
        let crosses = island(outcome.origin) != island(outcome.destination);
        assert_eq!(outcome.status == RouteStatus::Blocked, crosses);
    }
}

#[test]
fn rainfall_change_swaps_in_a_new_graph() {
    let fixture = Fixture::new("swap");
    let shared = SharedRoadGraph::new(create_road_graph(&fixture.config(50.0)).unwrap());
    let before = shared.snapshot();

    let previous = shared.replace(create_road_graph(&fixture.config(0.0)).unwrap());
    let after = shared.snapshot();

    assert_eq!(previous.meta().rain_mm, 50.0);
    assert_eq!(after.meta().rain_mm, 0.0);

    let suv = VehicleProfile::suv();
    let wet = route(&before, &suv, ImpassablePolicy::Degrade);
    let dry = route(&after, &suv, ImpassablePolicy::Degrade);
    assert!(dry.total_cost < wet.total_cost);
}
