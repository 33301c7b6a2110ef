//! Per-vehicle traversal cost of a road segment
//!
//! The cost of an edge is its travel time in seconds at the flood-reduced
//! speed plus a penalty proportional to the flooded area (depth x length)
//! the vehicle drives through.

use serde::{Deserialize, Serialize};

use crate::Cost;
use crate::model::{RoadEdge, VehicleProfile};

/// Lowest speed (km/h) a flooded vehicle is assumed to keep
pub const MIN_FLOOD_SPEED_KMPH: f64 = 0.1;

const KMPH_TO_MPS: f64 = 1000.0 / 3600.0;

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Speed in km/h of `profile` on `edge` after flood losses
pub fn flood_speed_kmph(edge: &RoadEdge, profile: &VehicleProfile) -> f64 {
    let effective_speed = profile.base_speed_kmph * profile.speed_multiplier(edge.road_class);
    let speed_loss = profile.flood_speed_loss_per_mm * (non_negative(edge.flood_depth) * 1000.0);
    MIN_FLOOD_SPEED_KMPH.max((effective_speed - speed_loss).max(0.0))
}

/// Cost of traversing `edge` with `profile`.
///
/// Always finite and non-negative. Speed never drops below
/// [`MIN_FLOOD_SPEED_KMPH`], so deep water alone never makes an edge
/// impassable; see [`ImpassablePolicy`] for that.
pub fn edge_cost(edge: &RoadEdge, profile: &VehicleProfile) -> Cost {
    let length = non_negative(edge.length);
    let flood_depth = non_negative(edge.flood_depth);

    let travel_time_seconds = length / (flood_speed_kmph(edge, profile) * KMPH_TO_MPS);
    let exposure = flood_depth * length;

    travel_time_seconds + exposure * profile.flood_penalty_lambda
}

/// What to do with edges flooded beyond a vehicle's impassable depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpassablePolicy {
    /// Only slow the vehicle down and penalize exposure
    #[default]
    Degrade,
    /// Treat the edge as closed (infinite cost)
    Block,
}

/// Edge weight function for one vehicle profile under one policy
#[derive(Debug, Clone, Copy)]
pub struct FloodCostModel<'a> {
    profile: &'a VehicleProfile,
    policy: ImpassablePolicy,
}

impl<'a> FloodCostModel<'a> {
    pub fn new(profile: &'a VehicleProfile, policy: ImpassablePolicy) -> Self {
        Self { profile, policy }
    }

    pub fn profile(&self) -> &'a VehicleProfile {
        self.profile
    }

    pub fn policy(&self) -> ImpassablePolicy {
        self.policy
    }

    /// True when the policy closes this edge to the vehicle
    pub fn is_blocked(&self, edge: &RoadEdge) -> bool {
        self.policy == ImpassablePolicy::Block
            && non_negative(edge.flood_depth) > self.profile.impassable_flood_depth_m
    }

    /// Edge cost, `f64::INFINITY` for blocked edges
    pub fn cost(&self, edge: &RoadEdge) -> Cost {
        if self.is_blocked(edge) {
            f64::INFINITY
        } else {
            edge_cost(edge, self.profile)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoadClass;

    fn residential(length: f64, depth: f64) -> RoadEdge {
        RoadEdge::new("e", length, RoadClass::Residential).with_flood_depth(depth)
    }

    #[test]
    fn suv_on_flooded_residential_street() {
        let suv = VehicleProfile::suv();
        let edge = residential(100.0, 0.2);
        // 32.5 km/h effective, 20 km/h lost to 200 mm of water
        assert!((flood_speed_kmph(&edge, &suv) - 12.5).abs() < 1e-9);
        // 28.8 s + 20 m^2 * 50
        assert!((edge_cost(&edge, &suv) - 1028.8).abs() < 0.1);
    }

    #[test]
    fn dry_highway_is_pure_travel_time() {
        let car = VehicleProfile::car();
        let edge = RoadEdge::new("h", 1000.0, RoadClass::Highway);
        // 55 * 1.8 = 99 km/h
        let expected = 1000.0 / (99.0 / 3.6);
        assert!((edge_cost(&edge, &car) - expected).abs() < 1e-9);
    }

    #[test]
    fn speed_is_floored() {
        let bike = VehicleProfile::bike();
        let edge = residential(10.0, 1.0);
        assert_eq!(flood_speed_kmph(&edge, &bike), MIN_FLOOD_SPEED_KMPH);
        let cost = edge_cost(&edge, &bike);
        assert!(cost.is_finite());
        assert!((cost - (10.0 / (0.1 / 3.6) + 10.0 * 500.0)).abs() < 1e-6);
    }

    #[test]
    fn zero_length_edges_are_free() {
        for profile in [VehicleProfile::suv(), VehicleProfile::car(), VehicleProfile::bike()] {
            assert_eq!(edge_cost(&residential(0.0, 0.4), &profile), 0.0);
        }
    }

    #[test]
    fn cost_is_non_negative_and_monotone_in_depth() {
        let profiles = [VehicleProfile::suv(), VehicleProfile::car(), VehicleProfile::bike()];
        let classes = [
            RoadClass::Highway,
            RoadClass::Primary,
            RoadClass::Secondary,
            RoadClass::Residential,
            RoadClass::Other,
        ];
        for profile in &profiles {
            for class in classes {
                for length in [0.0, 1.0, 37.5, 100.0, 2500.0] {
                    let mut previous = 0.0;
                    for step in 0..=100u32 {
                        let depth = f64::from(step) * 0.01;
                        let edge = RoadEdge::new("m", length, class).with_flood_depth(depth);
                        let cost = edge_cost(&edge, profile);
                        assert!(cost >= 0.0 && cost.is_finite());
                        assert!(cost >= previous, "{} {class} {length} {depth}", profile.name);
                        previous = cost;
                    }
                }
            }
        }
    }

    #[test]
    fn invalid_attributes_are_neutralized() {
        let suv = VehicleProfile::suv();
        assert_eq!(edge_cost(&residential(-5.0, 0.3), &suv), 0.0);
        let dry = edge_cost(&residential(100.0, 0.0), &suv);
        assert_eq!(edge_cost(&residential(100.0, f64::NAN), &suv), dry);
        assert_eq!(edge_cost(&residential(100.0, -1.0), &suv), dry);
    }

    #[test]
    fn block_policy_closes_deep_edges_only() {
        let car = VehicleProfile::car();
        let degrade = FloodCostModel::new(&car, ImpassablePolicy::Degrade);
        let block = FloodCostModel::new(&car, ImpassablePolicy::Block);

        let shallow = residential(100.0, 0.3);
        let deep = residential(100.0, 0.31);

        assert_eq!(block.cost(&shallow), edge_cost(&shallow, &car));
        assert!(block.cost(&deep).is_infinite());
        assert!(block.is_blocked(&deep));
        assert!(!degrade.is_blocked(&deep));
        assert_eq!(degrade.cost(&deep), edge_cost(&deep, &car));
    }

    #[test]
    fn policy_deserializes_lowercase() {
        let policy: ImpassablePolicy = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(policy, ImpassablePolicy::Block);
        assert_eq!(ImpassablePolicy::default(), ImpassablePolicy::Degrade);
    }
}
