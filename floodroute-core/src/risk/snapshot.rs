//! Reading persisted per-road elevation snapshots and turning them into
//! risk records for a given rainfall intensity.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hashbrown::HashMap;
use log::{debug, warn};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{RiskLevel, RoadElevation, compute_road_risk};
use crate::Error;

/// Risk of one road under one rainfall intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub id: String,
    pub length: f64,
    pub risk: f64,
    pub level: RiskLevel,
    pub avg_elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_elev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_elev: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRoadRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    length: Option<f64>,
    #[serde(default, alias = "avg_elev")]
    avg_elevation: Option<f64>,
    #[serde(default)]
    min_elev: Option<f64>,
    #[serde(default)]
    max_elev: Option<f64>,
}

fn road_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Stable position of a road's average inside its synthesized range, in
/// `[0, 1)`: the first four MD5 digest bytes of the id, modulo 1000.
///
/// Snapshots written by the elevation tooling rely on this exact scheme, so
/// the hash must not change.
pub fn elevation_offset(id: &str) -> f64 {
    let digest = Md5::digest(id.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    f64::from(prefix % 1000) / 1000.0
}

/// Fill in a missing elevation range around the average elevation.
///
/// The spread grows with road length (2%, clamped to 0.5..20 m) and the
/// average is placed at a stable, id-dependent position inside it so that
/// slope and relative elevation vary between roads.
pub fn synthesize_elevation_range(road: &mut RoadElevation) {
    let Some(avg) = road.avg_elevation.filter(|a| a.is_finite()) else {
        return;
    };
    if road.min_elev.is_some() && road.max_elev.is_some() {
        return;
    }

    let length = if road.length.is_finite() {
        road.length
    } else {
        0.0
    };
    let spread = (length * 0.02).clamp(0.5, 20.0);
    let pos = 0.1 + 0.8 * elevation_offset(&road.id);

    let min_elev = *road.min_elev.get_or_insert(avg - pos * spread);
    road.max_elev.get_or_insert(min_elev + spread);
}

/// Parse a risk snapshot: a flat JSON array of road elevation records.
///
/// Records without a usable id are skipped.
pub fn parse_risk_snapshot(json: &str) -> Result<Vec<RoadElevation>, Error> {
    let raw: Vec<RawRoadRecord> = serde_json::from_str(json)?;
    Ok(collect_roads(raw))
}

/// Read a risk snapshot file from disk.
///
/// The file is read fresh on every call so that an updated snapshot takes
/// effect without restarting the process.
pub fn read_risk_snapshot(path: &Path) -> Result<Vec<RoadElevation>, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open risk snapshot '{}': {}", path.display(), e),
        )
    })?;
    let raw: Vec<RawRoadRecord> = serde_json::from_reader(BufReader::new(file))?;
    let roads = collect_roads(raw);
    debug!("Read {} road records from {}", roads.len(), path.display());
    Ok(roads)
}

fn collect_roads(raw: Vec<RawRoadRecord>) -> Vec<RoadElevation> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            let Some(id) = record.id.as_ref().and_then(road_id_from_value) else {
                warn!("Risk record #{idx} has no usable id - skipping");
                return None;
            };
            let mut road = RoadElevation {
                id,
                length: record.length.unwrap_or(0.0),
                avg_elevation: record.avg_elevation,
                min_elev: record.min_elev,
                max_elev: record.max_elev,
            };
            synthesize_elevation_range(&mut road);
            Some(road)
        })
        .collect()
}

/// Compute risk records for every road without any rounding.
pub fn assess_roads(roads: &[RoadElevation], rain_mm: f64) -> Vec<RiskRecord> {
    roads
        .iter()
        .map(|road| {
            let (risk, level) = compute_road_risk(road, rain_mm);
            RiskRecord {
                id: road.id.clone(),
                length: road.length,
                risk,
                level,
                avg_elevation: road.avg_elevation,
                min_elev: road.min_elev,
                max_elev: road.max_elev,
            }
        })
        .collect()
}

/// Risk lookup keyed by road id, used to join risk onto road geometry
pub fn risk_index(roads: &[RoadElevation], rain_mm: f64) -> HashMap<String, (f64, RiskLevel)> {
    roads
        .iter()
        .map(|road| (road.id.clone(), compute_road_risk(road, rain_mm)))
        .collect()
}

/// Recompute the risk of every road in the snapshot for `rain_mm`.
///
/// Nothing is cached: the snapshot is re-read and every record recomputed on
/// each call. Risk values are rounded to two decimals.
pub fn compute_all_roads(snapshot_path: &Path, rain_mm: f64) -> Result<Vec<RiskRecord>, Error> {
    let roads = read_risk_snapshot(snapshot_path)?;
    let mut records = assess_roads(&roads, rain_mm);
    for record in &mut records {
        record.risk = (record.risk * 100.0).round() / 100.0;
    }
    Ok(records)
}
