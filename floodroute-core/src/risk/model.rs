//! Per-road flood risk from rainfall, slope and relative elevation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rainfall intensity (mm/hr) that saturates the rain factor
pub const MAX_RAIN_MM: f64 = 50.0;

pub const RAIN_WEIGHT: f64 = 0.55;
pub const ELEV_WEIGHT: f64 = 0.25;
pub const FLAT_WEIGHT: f64 = 0.20;

/// Discrete severity bucket derived from a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "very high")]
    VeryHigh,
}

impl RiskLevel {
    /// Bucket boundaries belong to the lower level.
    pub fn from_risk(risk: f64) -> Self {
        if risk > 0.70 {
            RiskLevel::VeryHigh
        } else if risk > 0.45 {
            RiskLevel::High
        } else if risk > 0.20 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elevation summary of one road, as delivered by the elevation provider.
///
/// Every numeric field may be missing; missing or non-finite values are
/// treated as zero when risk is computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadElevation {
    pub id: String,
    pub length: f64,
    pub avg_elevation: Option<f64>,
    pub min_elev: Option<f64>,
    pub max_elev: Option<f64>,
}

/// Normalize a rainfall intensity (mm/hr) into `0..=1`.
pub fn normalize_rain(rain_mm: f64) -> f64 {
    if rain_mm.is_finite() {
        (rain_mm / MAX_RAIN_MM).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Compute the risk score and severity level of one road.
///
/// The elevation and flatness terms are scaled by the normalized rainfall,
/// so the score is exactly zero when it does not rain.
pub fn compute_road_risk(road: &RoadElevation, rain_mm: f64) -> (f64, RiskLevel) {
    let rain_norm = normalize_rain(rain_mm);

    let length = finite_or_zero(Some(road.length));
    let min_elev = finite_or_zero(road.min_elev);
    let max_elev = finite_or_zero(road.max_elev);
    let avg_elev = finite_or_zero(road.avg_elevation);

    let slope = if length > 0.0 {
        ((max_elev - min_elev).max(0.0) / length).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let flatness = 1.0 - slope;

    let range = max_elev - min_elev;
    let norm_elev = if range > 0.0 {
        ((avg_elev - min_elev) / range).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let low_elev_factor = 1.0 - norm_elev;

    let terrain = low_elev_factor * ELEV_WEIGHT + flatness * FLAT_WEIGHT;
    let risk = (rain_norm * (RAIN_WEIGHT + terrain)).clamp(0.0, 1.0);

    (risk, RiskLevel::from_risk(risk))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn road(length: f64, avg: f64, min: f64, max: f64) -> RoadElevation {
        RoadElevation {
            id: "r".to_string(),
            length,
            avg_elevation: Some(avg),
            min_elev: Some(min),
            max_elev: Some(max),
        }
    }

    #[test]
    fn dry_roads_carry_no_risk() {
        for r in [
            road(100.0, 900.0, 880.0, 920.0),
            road(0.0, 0.0, 0.0, 0.0),
            road(5.0, 10.0, 12.0, 3.0),
        ] {
            let (risk, level) = compute_road_risk(&r, 0.0);
            assert_eq!(risk, 0.0);
            assert_eq!(level, RiskLevel::Low);
        }
    }

    #[test]
    fn flat_low_road_under_max_rain() {
        // zero slope, avg at the bottom of its range
        let (risk, level) = compute_road_risk(&road(1000.0, 0.0, 0.0, 0.0), 50.0);
        // norm_elev = 0 because the range is empty: 0.55 + 0.25 + 0.20
        assert!((risk - 1.0).abs() < 1e-12);
        assert_eq!(level, RiskLevel::VeryHigh);
    }

    #[test]
    fn weighted_terms() {
        // slope = 10/100 = 0.1, norm_elev = 0.5
        let (risk, _) = compute_road_risk(&road(100.0, 105.0, 100.0, 110.0), 25.0);
        let expected = 0.5 * (0.55 + 0.5 * 0.25 + 0.9 * 0.20);
        assert!((risk - expected).abs() < 1e-12);
    }

    #[test]
    fn inverted_range_is_treated_as_flat() {
        let (risk, _) = compute_road_risk(&road(10.0, 5.0, 20.0, 0.0), 50.0);
        // numerator clamps to 0 and the empty range gives norm_elev = 0
        assert!((risk - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_and_non_finite_inputs_are_neutral() {
        let sparse = RoadElevation {
            id: "x".into(),
            length: f64::NAN,
            avg_elevation: None,
            min_elev: Some(f64::INFINITY),
            max_elev: None,
        };
        let (risk, level) = compute_road_risk(&sparse, 50.0);
        assert!((0.0..=1.0).contains(&risk));
        assert_eq!(level, RiskLevel::VeryHigh);

        let (risk, _) = compute_road_risk(&sparse, f64::NAN);
        assert_eq!(risk, 0.0);
    }

    #[test]
    fn risk_is_bounded_and_monotone_in_rain() {
        let roads = [
            road(100.0, 905.0, 900.0, 950.0),
            road(3.0, 1.0, 0.0, 40.0),
            road(250.0, 12.0, 11.0, 12.5),
        ];
        for r in &roads {
            let mut previous = 0.0;
            for step in 0..=120u32 {
                let rain = f64::from(step) * 0.5;
                let (risk, _) = compute_road_risk(r, rain);
                assert!((0.0..=1.0).contains(&risk));
                assert!(risk >= previous);
                previous = risk;
            }
        }
    }

    #[test]
    fn level_boundaries_belong_to_lower_bucket() {
        assert_eq!(RiskLevel::from_risk(0.20), RiskLevel::Low);
        assert_eq!(RiskLevel::from_risk(0.2001), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_risk(0.45), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_risk(0.70), RiskLevel::High);
        assert_eq!(RiskLevel::from_risk(0.71), RiskLevel::VeryHigh);
    }

    #[test]
    fn level_serializes_with_spaces() {
        let json = serde_json::to_string(&RiskLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"very high\"");
        assert_eq!(RiskLevel::High.to_string(), "high");
    }
}
