use geo::{Coord, LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::route::RouteResult;
use crate::Error;

impl RouteResult {
    /// Converts the route to a `GeoJSON` `Feature`.
    ///
    /// Successful routes become a `LineString` (a `Point` when origin and
    /// destination share a node); blocked routes have no geometry.
    pub fn to_geojson(&self, color: Option<&str>) -> Result<Feature, Error> {
        let geometry = match self.path.as_slice() {
            [] => None,
            [[lon, lat]] => Some(Geometry::new(GeoJsonValue::from(&Point::new(*lon, *lat)))),
            coords => {
                let line: LineString<f64> = coords
                    .iter()
                    .map(|&[x, y]| Coord { x, y })
                    .collect();
                Some(Geometry::new(GeoJsonValue::from(&line)))
            }
        };

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "vehicle_type": self.vehicle_type,
                "status": self.status,
                "total_cost": self.total_cost.is_finite().then_some(self.total_cost),
                "color": color,
            }
        });

        Ok(serde_json::from_value::<Feature>(value).map_err(geojson::Error::from)?)
    }
}

/// Collects route features into one `GeoJSON` `FeatureCollection`.
pub fn routes_to_geojson<'a, I>(routes: I) -> Result<FeatureCollection, Error>
where
    I: IntoIterator<Item = (&'a RouteResult, Option<&'a str>)>,
{
    let features = routes
        .into_iter()
        .map(|(route, color)| route.to_geojson(color))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}
