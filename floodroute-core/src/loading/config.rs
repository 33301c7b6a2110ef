use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cost::ImpassablePolicy;
use crate::{DEFAULT_NODE_PRECISION, Error};

/// Highest accepted node key precision in decimal places
pub const MAX_NODE_PRECISION: u32 = 9;

fn default_rain_mm() -> f64 {
    50.0
}

fn default_node_precision() -> u32 {
    DEFAULT_NODE_PRECISION
}

fn default_max_flood_depth_m() -> f64 {
    0.5
}

/// Inputs for building a road graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadModelConfig {
    /// GeoJSON `FeatureCollection` of road polylines
    pub roads_path: PathBuf,
    /// JSON array of per-road elevation records
    pub risk_path: PathBuf,
    /// Rainfall intensity in mm/hr
    #[serde(default = "default_rain_mm")]
    pub rain_mm: f64,
    #[serde(default = "default_node_precision")]
    pub node_precision: u32,
    /// Flood depth of a road at risk 1.0, in meters
    #[serde(default = "default_max_flood_depth_m")]
    pub max_flood_depth_m: f64,
    #[serde(default)]
    pub impassable_policy: ImpassablePolicy,
}

impl RoadModelConfig {
    pub fn new(roads_path: impl Into<PathBuf>, risk_path: impl Into<PathBuf>) -> Self {
        Self {
            roads_path: roads_path.into(),
            risk_path: risk_path.into(),
            rain_mm: default_rain_mm(),
            node_precision: default_node_precision(),
            max_flood_depth_m: default_max_flood_depth_m(),
            impassable_policy: ImpassablePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_rain(mut self, rain_mm: f64) -> Self {
        self.rain_mm = rain_mm;
        self
    }

    /// Check numeric settings. Paths are checked when the graph is built.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.rain_mm.is_finite() || self.rain_mm < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "rain_mm must be a non-negative number, got {}",
                self.rain_mm
            )));
        }
        if !self.max_flood_depth_m.is_finite() || self.max_flood_depth_m < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_flood_depth_m must be a non-negative number, got {}",
                self.max_flood_depth_m
            )));
        }
        if self.node_precision > MAX_NODE_PRECISION {
            return Err(Error::InvalidConfig(format!(
                "node_precision must be at most {MAX_NODE_PRECISION}, got {}",
                self.node_precision
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: RoadModelConfig = serde_json::from_str(
            r#"{"roads_path": "roads.geojson", "risk_path": "risk.json"}"#,
        )
        .unwrap();
        assert_eq!(config, RoadModelConfig::new("roads.geojson", "risk.json"));
        assert_eq!(config.rain_mm, 50.0);
        assert_eq!(config.node_precision, 5);
        assert_eq!(config.impassable_policy, ImpassablePolicy::Degrade);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let base = RoadModelConfig::new("a", "b");
        assert!(base.clone().with_rain(-1.0).validate().is_err());
        assert!(base.clone().with_rain(f64::NAN).validate().is_err());

        let mut config = base.clone();
        config.max_flood_depth_m = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = base;
        config.node_precision = 12;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
