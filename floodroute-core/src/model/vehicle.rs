//! Vehicle classes and the road classes they are priced against

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Coarse road category used to scale vehicle speed.
///
/// Unknown OSM `highway` values fall into [`RoadClass::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RoadClass {
    Highway,
    Primary,
    Secondary,
    #[default]
    Residential,
    Other,
}

impl RoadClass {
    /// Map an OSM `highway` tag (or one of the class names) to a road class.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        let base = tag.strip_suffix("_link").unwrap_or(&tag);
        match base {
            "highway" | "motorway" | "trunk" => RoadClass::Highway,
            "primary" => RoadClass::Primary,
            "secondary" => RoadClass::Secondary,
            "residential" | "living_street" => RoadClass::Residential,
            _ => RoadClass::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Highway => "highway",
            RoadClass::Primary => "primary",
            RoadClass::Secondary => "secondary",
            RoadClass::Residential => "residential",
            RoadClass::Other => "other",
        }
    }
}

impl From<String> for RoadClass {
    fn from(value: String) -> Self {
        RoadClass::from_tag(&value)
    }
}

impl From<&str> for RoadClass {
    fn from(value: &str) -> Self {
        RoadClass::from_tag(value)
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of how a vehicle class moves through flooded roads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub name: String,
    /// Free-flow speed in km/h
    pub base_speed_kmph: f64,
    /// Speed multiplier per road class, 1.0 when absent
    #[serde(default)]
    pub road_multipliers: HashMap<RoadClass, f64>,
    /// Flood depth (m) the vehicle is not expected to cross
    pub impassable_flood_depth_m: f64,
    /// km/h of speed lost per millimetre of standing water
    pub flood_speed_loss_per_mm: f64,
    /// Weight of flood exposure (depth x length) in the edge cost
    pub flood_penalty_lambda: f64,
    /// Display color, unused by routing
    #[serde(default)]
    pub color: String,
}

impl VehicleProfile {
    pub fn speed_multiplier(&self, class: RoadClass) -> f64 {
        self.road_multipliers.get(&class).copied().unwrap_or(1.0)
    }

    /// Check that every numeric parameter is usable by the cost model
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "Vehicle profile name must not be empty".to_string(),
            ));
        }
        if !(self.base_speed_kmph.is_finite() && self.base_speed_kmph > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "Vehicle '{}': base speed must be positive, got {}",
                self.name, self.base_speed_kmph
            )));
        }

        let non_negative = [
            ("impassable flood depth", self.impassable_flood_depth_m),
            ("flood speed loss", self.flood_speed_loss_per_mm),
            ("flood penalty", self.flood_penalty_lambda),
        ];
        for (what, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "Vehicle '{}': {what} must be finite and non-negative, got {value}",
                    self.name
                )));
            }
        }

        for (class, multiplier) in &self.road_multipliers {
            if !(multiplier.is_finite() && *multiplier >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "Vehicle '{}': multiplier for {class} must be finite and non-negative",
                    self.name
                )));
            }
        }
        Ok(())
    }

    fn builtin(
        name: &str,
        base_speed_kmph: f64,
        multipliers: [f64; 4],
        impassable_flood_depth_m: f64,
        flood_speed_loss_per_mm: f64,
        flood_penalty_lambda: f64,
        color: &str,
    ) -> Self {
        let classes = [
            RoadClass::Highway,
            RoadClass::Primary,
            RoadClass::Secondary,
            RoadClass::Residential,
        ];
        Self {
            name: name.to_string(),
            base_speed_kmph,
            road_multipliers: classes.into_iter().zip(multipliers).collect(),
            impassable_flood_depth_m,
            flood_speed_loss_per_mm,
            flood_penalty_lambda,
            color: color.to_string(),
        }
    }

    pub fn suv() -> Self {
        Self::builtin("suv", 50.0, [2.0, 1.0, 0.85, 0.65], 0.6, 0.1, 50.0, "#1f77b4")
    }

    pub fn car() -> Self {
        Self::builtin("car", 55.0, [1.8, 0.9, 0.75, 0.75], 0.3, 0.2, 200.0, "#ff7f0e")
    }

    pub fn bike() -> Self {
        Self::builtin("bike", 40.0, [1.5, 1.0, 0.9, 0.8], 0.1, 0.5, 500.0, "#2ca02c")
    }
}

/// Immutable set of vehicle profiles, built once and passed by reference
#[derive(Debug, Clone)]
pub struct VehicleFleet {
    profiles: Vec<VehicleProfile>,
}

impl Default for VehicleFleet {
    fn default() -> Self {
        Self {
            profiles: vec![
                VehicleProfile::suv(),
                VehicleProfile::car(),
                VehicleProfile::bike(),
            ],
        }
    }
}

impl VehicleFleet {
    /// Build a fleet from explicit profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, a profile is invalid or two
    /// profiles share a name (case-insensitively).
    pub fn new(profiles: Vec<VehicleProfile>) -> Result<Self, Error> {
        if profiles.is_empty() {
            return Err(Error::InvalidConfig(
                "Vehicle fleet must contain at least one profile".to_string(),
            ));
        }
        for (idx, profile) in profiles.iter().enumerate() {
            profile.validate()?;
            if profiles[..idx]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&profile.name))
            {
                return Err(Error::InvalidConfig(format!(
                    "Duplicate vehicle profile '{}'",
                    profile.name
                )));
            }
        }
        Ok(Self { profiles })
    }

    /// Case-insensitive lookup by vehicle type name
    pub fn get(&self, vehicle_type: &str) -> Result<&VehicleProfile, Error> {
        let wanted = vehicle_type.trim();
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownVehicleType(vehicle_type.to_string()))
    }

    pub fn profiles(&self) -> &[VehicleProfile] {
        &self.profiles
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
