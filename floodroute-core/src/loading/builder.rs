use geo::{Distance, Haversine, Point};
use hashbrown::HashMap;
use itertools::Itertools;
use log::{info, warn};

use super::config::RoadModelConfig;
use super::geometry::{RoadFeature, read_road_features};
use crate::Error;
use crate::model::{RoadEdge, RoadGraph, RoadGraphBuilder, RoadGraphMeta};
use crate::risk::{RiskLevel, RoadElevation, compute_road_risk, read_risk_snapshot};

/// Creates a road graph from the files named in the configuration.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or either input file is
/// missing or malformed.
pub fn create_road_graph(config: &RoadModelConfig) -> Result<RoadGraph, Error> {
    validate_config(config)?;

    info!("Reading road geometry: {}", config.roads_path.display());
    let features = read_road_features(&config.roads_path)?;

    info!("Reading risk snapshot: {}", config.risk_path.display());
    let roads = read_risk_snapshot(&config.risk_path)?;

    let graph = build_road_graph(&features, &roads, config);
    info!(
        "Road graph for {} mm/hr rainfall: {} nodes, {} edges",
        config.rain_mm,
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn validate_config(config: &RoadModelConfig) -> Result<(), Error> {
    config.validate()?;

    if !config.roads_path.exists() {
        return Err(Error::InvalidData(format!(
            "Road geometry file not found: {}",
            config.roads_path.display()
        )));
    }
    if !config.risk_path.exists() {
        return Err(Error::InvalidData(format!(
            "Risk snapshot file not found: {}",
            config.risk_path.display()
        )));
    }
    Ok(())
}

/// Build a road graph from polylines and elevation records.
///
/// Every pair of consecutive vertices becomes one edge carrying the risk of
/// its road under `config.rain_mm`. Flood depth is the road's risk scaled by
/// `config.max_flood_depth_m`, unless the polyline carries its own depth.
/// Roads without an elevation record are treated as dry and low risk.
pub fn build_road_graph(
    features: &[RoadFeature],
    roads: &[RoadElevation],
    config: &RoadModelConfig,
) -> RoadGraph {
    let by_id: HashMap<&str, &RoadElevation> =
        roads.iter().map(|road| (road.id.as_str(), road)).collect();

    let mut builder = RoadGraphBuilder::new(RoadGraphMeta {
        rain_mm: config.rain_mm,
        node_precision: config.node_precision,
    });

    let mut unmatched = 0usize;
    for feature in features {
        let elevation = by_id.get(feature.id.as_str()).copied();
        let (risk, level) = match elevation {
            Some(road) => compute_road_risk(road, config.rain_mm),
            None => {
                unmatched += 1;
                (0.0, RiskLevel::Low)
            }
        };
        let flood_depth = feature
            .flood_depth
            .unwrap_or(risk * config.max_flood_depth_m);

        for (from, to) in feature.coordinates.iter().copied().tuple_windows() {
            let edge = RoadEdge {
                road_id: feature.id.clone(),
                length: Haversine.distance(Point::from(from), Point::from(to)),
                road_class: feature.class,
                flood_depth,
                risk,
                level,
                avg_elevation: elevation.and_then(|r| r.avg_elevation),
                min_elev: elevation.and_then(|r| r.min_elev),
                max_elev: elevation.and_then(|r| r.max_elev),
            };
            builder.add_segment(from, to, edge);
        }
    }

    if unmatched > 0 {
        warn!(
            "{unmatched} of {} road polylines have no elevation record and are treated as dry",
            features.len()
        );
    }

    builder.build()
}
