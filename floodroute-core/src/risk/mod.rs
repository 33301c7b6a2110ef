//! Flood risk of individual roads under a rainfall intensity

mod model;
mod snapshot;

pub use model::{
    ELEV_WEIGHT, FLAT_WEIGHT, MAX_RAIN_MM, RAIN_WEIGHT, RiskLevel, RoadElevation,
    compute_road_risk, normalize_rain,
};
pub use snapshot::{
    RiskRecord, assess_roads, compute_all_roads, parse_risk_snapshot, read_risk_snapshot,
    elevation_offset, risk_index, synthesize_elevation_range,
};
