use std::path::Path;

use floodroute_core::{Error, RoadModelConfig, VehicleFleet, VehicleProfile};
use serde::Deserialize;

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Vehicles simulated when a request does not say
    pub default_vehicle_count: usize,
    pub max_vehicle_count: usize,
    /// Seed used when a request does not carry one
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            default_vehicle_count: 50,
            max_vehicle_count: 10_000,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub request_timeout_secs: u64,
    pub concurrency_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            concurrency_limit: 64,
        }
    }
}

/// Server configuration, read from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    pub model: RoadModelConfig,
    /// Vehicle profiles; the built-in suv, car and bike when empty
    #[serde(default)]
    pub vehicles: Vec<VehicleProfile>,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub limits: Limits,
}

impl ServerConfig {
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(text).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.model.validate()?;
        if self.simulation.max_vehicle_count == 0 {
            return Err(Error::InvalidConfig(
                "simulation.max_vehicle_count must be positive".to_string(),
            ));
        }
        if self.simulation.default_vehicle_count > self.simulation.max_vehicle_count {
            return Err(Error::InvalidConfig(format!(
                "simulation.default_vehicle_count ({}) exceeds max_vehicle_count ({})",
                self.simulation.default_vehicle_count, self.simulation.max_vehicle_count
            )));
        }
        if self.limits.request_timeout_secs == 0 || self.limits.concurrency_limit == 0 {
            return Err(Error::InvalidConfig(
                "limits must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fleet(&self) -> Result<VehicleFleet, Error> {
        if self.vehicles.is_empty() {
            Ok(VehicleFleet::default())
        } else {
            VehicleFleet::new(self.vehicles.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use floodroute_core::{ImpassablePolicy, RoadClass};

    use super::*;

    #[test]
    fn minimal_config() {
        let config = ServerConfig::from_toml(
            r#"
            [model]
            roads_path = "data/roads.geojson"
            risk_path = "data/road_risk.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:8000");
        assert_eq!(config.model.rain_mm, 50.0);
        assert_eq!(config.simulation, SimulationSettings::default());
        assert_eq!(config.fleet().unwrap().len(), 3);
    }

    #[test]
    fn full_config() {
        let config = ServerConfig::from_toml(
            r##"
            bind = "0.0.0.0:9000"

            [model]
            roads_path = "roads.geojson"
            risk_path = "risk.json"
            rain_mm = 20.0
            impassable_policy = "block"

            [[vehicles]]
            name = "truck"
            base_speed_kmph = 45.0
            impassable_flood_depth_m = 0.9
            flood_speed_loss_per_mm = 0.05
            flood_penalty_lambda = 20.0
            color = "#444444"
            road_multipliers = { highway = 1.6, residential = 0.5 }

            [simulation]
            default_vehicle_count = 10
            max_vehicle_count = 100
            seed = 7

            [limits]
            request_timeout_secs = 5
            "##,
        )
        .unwrap();

        assert_eq!(config.model.impassable_policy, ImpassablePolicy::Block);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.limits.request_timeout_secs, 5);
        assert_eq!(config.limits.concurrency_limit, 64);

        let fleet = config.fleet().unwrap();
        let truck = fleet.get("Truck").unwrap();
        assert_eq!(truck.speed_multiplier(RoadClass::Highway), 1.6);
        assert_eq!(truck.speed_multiplier(RoadClass::Secondary), 1.0);
        assert!(fleet.get("car").is_err());
    }

    #[test]
    fn inconsistent_settings_are_rejected() {
        let err = ServerConfig::from_toml(
            r#"
            [model]
            roads_path = "a"
            risk_path = "b"

            [simulation]
            default_vehicle_count = 500
            max_vehicle_count = 100
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        assert!(ServerConfig::from_toml("bind = 3").is_err());
    }
}
