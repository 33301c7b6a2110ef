//! Road polylines from a `GeoJSON` `FeatureCollection`

use std::path::Path;

use geo::{Coord, Geometry, LineString};
use geojson::feature::Id;
use geojson::{Feature, GeoJson};
use log::{debug, warn};
use serde_json::Value as JsonValue;

use crate::Error;
use crate::model::RoadClass;

/// One road polyline as read from the geometry source
#[derive(Debug, Clone, PartialEq)]
pub struct RoadFeature {
    pub id: String,
    pub class: RoadClass,
    /// `(lon, lat)` vertices
    pub coordinates: Vec<Coord<f64>>,
    /// Explicit standing water depth in meters, overriding the risk-derived one
    pub flood_depth: Option<f64>,
}

fn id_from_json(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        // OSMnx writes merged ways as a list of ids
        JsonValue::Array(items) => items.first().and_then(id_from_json),
        _ => None,
    }
}

/// Road id in the order the risk snapshot keys roads by: `osmid`, then the
/// `id` property, then the feature id.
fn feature_id(feature: &Feature, index: usize) -> String {
    feature
        .property("osmid")
        .and_then(id_from_json)
        .or_else(|| feature.property("id").and_then(id_from_json))
        .or_else(|| match &feature.id {
            Some(Id::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Id::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("feature-{index}"))
}

fn road_class(feature: &Feature) -> RoadClass {
    match feature.property("highway") {
        Some(JsonValue::String(tag)) => RoadClass::from_tag(tag),
        Some(JsonValue::Array(tags)) => tags
            .first()
            .and_then(JsonValue::as_str)
            .map_or_else(RoadClass::default, RoadClass::from_tag),
        _ => RoadClass::default(),
    }
}

fn polyline(line: LineString<f64>) -> Vec<Coord<f64>> {
    line.into_iter()
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .collect()
}

/// Fewer than two distinct vertices cannot form a segment
fn is_degenerate(coordinates: &[Coord<f64>]) -> bool {
    coordinates
        .split_first()
        .is_none_or(|(first, rest)| rest.iter().all(|c| c == first))
}

/// Extract road polylines from a parsed `GeoJSON` document.
///
/// `MultiLineString` features yield one polyline per part, all sharing the
/// feature's id. Non-line geometries and degenerate polylines are skipped.
pub fn road_features(geojson: GeoJson) -> Result<Vec<RoadFeature>, Error> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => geojson::FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(_) => {
            return Err(Error::InvalidData(
                "Road geometry must be a GeoJSON FeatureCollection".to_string(),
            ));
        }
    };

    let mut roads = Vec::with_capacity(collection.features.len());
    let mut dropped = 0usize;
    for (index, mut feature) in collection.features.into_iter().enumerate() {
        let id = feature_id(&feature, index);
        let Some(geometry) = feature.geometry.take() else {
            warn!("Skipping road {id}: no geometry");
            continue;
        };
        let parts = match Geometry::<f64>::try_from(geometry) {
            Ok(Geometry::LineString(line)) => vec![polyline(line)],
            Ok(Geometry::MultiLineString(lines)) => lines.into_iter().map(polyline).collect(),
            Ok(_) => {
                warn!("Skipping road {id}: not a line geometry");
                continue;
            }
            Err(err) => {
                warn!("Skipping road {id}: {err}");
                continue;
            }
        };

        let class = road_class(&feature);
        let flood_depth = feature
            .property("flood_depth")
            .and_then(JsonValue::as_f64)
            .filter(|d| d.is_finite() && *d >= 0.0);

        for coordinates in parts {
            if is_degenerate(&coordinates) {
                dropped += 1;
                continue;
            }
            roads.push(RoadFeature {
                id: id.clone(),
                class,
                coordinates,
                flood_depth,
            });
        }
    }

    if dropped > 0 {
        warn!("Dropped {dropped} degenerate road polylines");
    }
    debug!("Read {} road polylines", roads.len());
    Ok(roads)
}

/// Parse road polylines from `GeoJSON` text
pub fn parse_road_features(text: &str) -> Result<Vec<RoadFeature>, Error> {
    road_features(text.parse::<GeoJson>()?)
}

/// Read road polylines from a `GeoJSON` file
pub fn read_road_features(path: &Path) -> Result<Vec<RoadFeature>, Error> {
    let text = std::fs::read_to_string(path)?;
    parse_road_features(&text)
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    const ROADS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "way/1",
                "properties": {"highway": "primary_link", "osmid": 99},
                "geometry": {"type": "LineString", "coordinates": [[77.0, 12.0], [77.001, 12.0]]}
            },
            {
                "type": "Feature",
                "properties": {"osmid": [42, 43], "highway": ["trunk", "primary"]},
                "geometry": {"type": "MultiLineString", "coordinates": [
                    [[77.0, 12.0], [77.0, 12.001]],
                    [[77.0, 12.001], [77.0, 12.001]]
                ]}
            },
            {
                "type": "Feature",
                "id": 7,
                "properties": {"id": "w-7", "highway": "secondary"},
                "geometry": {"type": "LineString", "coordinates": [[2.0, 2.0], [2.0, 2.001]]}
            },
            {
                "type": "Feature",
                "id": "way/8",
                "properties": {},
                "geometry": {"type": "LineString", "coordinates": [[3.0, 3.0], [3.0, 3.001]]}
            },
            {
                "type": "Feature",
                "properties": {"flood_depth": 0.4},
                "geometry": {"type": "LineString", "coordinates": [[1.0, 1.0, 900.0], [1.0, 1.001]]}
            },
            {
                "type": "Feature",
                "properties": {"id": "single"},
                "geometry": {"type": "LineString", "coordinates": [[1.0, 1.0]]}
            },
            {
                "type": "Feature",
                "properties": {"id": "stop"},
                "geometry": {"type": "Point", "coordinates": [1.0, 1.0]}
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn reads_ids_classes_and_depths() {
        let roads = parse_road_features(ROADS).unwrap();
        let ids: Vec<_> = roads.iter().map(|r| r.id.as_str()).collect();
        // osmid wins over both the id property and the feature id
        assert_eq!(ids, ["99", "42", "w-7", "way/8", "feature-4"]);

        assert_eq!(roads[0].class, RoadClass::Primary);
        assert_eq!(roads[1].class, RoadClass::Highway);
        assert_eq!(roads[2].class, RoadClass::Secondary);
        assert_eq!(roads[4].class, RoadClass::Residential);

        assert_eq!(roads[0].flood_depth, None);
        assert_eq!(roads[4].flood_depth, Some(0.4));
        // elevation component is ignored
        assert_eq!(roads[4].coordinates[0], coord! { x: 1.0, y: 1.0 });
    }

    #[test]
    fn degenerate_lines_are_detected() {
        assert!(is_degenerate(&[]));
        assert!(is_degenerate(&[coord! { x: 1.0, y: 1.0 }]));
        assert!(is_degenerate(&[coord! { x: 1.0, y: 1.0 }, coord! { x: 1.0, y: 1.0 }]));
        assert!(!is_degenerate(&[coord! { x: 1.0, y: 1.0 }, coord! { x: 1.0, y: 2.0 }]));
    }

    #[test]
    fn bare_geometry_is_rejected() {
        let err = parse_road_features(r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(matches!(
            parse_road_features("not json"),
            Err(Error::GeoJsonError(_))
        ));
    }
}
