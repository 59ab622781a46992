//! Operating zone of a service and analysis zones for aggregation

use std::fmt;

use geo::{Contains, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use wkt::TryFromWkt;

use super::crs::Crs;
use crate::Error;

/// Where a trip starts and ends relative to the operating zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// Origin and destination inside
    Inland,
    /// Exactly one of origin and destination inside
    Od,
    /// Neither inside
    Outside,
}

impl RelationType {
    pub fn classify(starts_in_zone: bool, ends_in_zone: bool) -> Self {
        match (starts_in_zone, ends_in_zone) {
            (true, true) => RelationType::Inland,
            (false, false) => RelationType::Outside,
            _ => RelationType::Od,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Inland => "inland",
            RelationType::Od => "od",
            RelationType::Outside => "outside",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single polygon delimiting the service area
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingZone {
    pub polygon: Polygon<f64>,
    pub crs: Crs,
}

impl OperatingZone {
    pub fn new(polygon: Polygon<f64>, crs: Crs) -> Self {
        Self { polygon, crs }
    }

    /// Build the zone from GeoJSON: a Polygon geometry, or a Feature or
    /// FeatureCollection holding exactly one polygon.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid GeoJSON or holds anything but one polygon
    pub fn from_geojson(geojson: &str, crs: Crs) -> Result<Self, Error> {
        let parsed: GeoJson = geojson
            .parse()
            .map_err(|e| Error::InvalidData(format!("Invalid GeoJSON: {e}")))?;

        let geometries = match parsed {
            GeoJson::Geometry(geometry) => vec![geometry],
            GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .filter_map(|feature| feature.geometry)
                .collect(),
        };

        let [geometry] = <[_; 1]>::try_from(geometries).map_err(|found: Vec<_>| {
            Error::InvalidData(format!(
                "The operating zone must consist of exactly one polygon, got {} geometries",
                found.len()
            ))
        })?;
        let geometry = geo::Geometry::<f64>::try_from(geometry)
            .map_err(|e| Error::InvalidData(format!("Invalid operating zone geometry: {e}")))?;

        Ok(Self::new(single_polygon(geometry)?, crs))
    }

    /// Build the zone from a WKT `POLYGON` (or single-part `MULTIPOLYGON`)
    ///
    /// # Errors
    ///
    /// Returns an error if the WKT cannot be parsed or holds anything but one polygon
    pub fn from_wkt(wkt: &str, crs: Crs) -> Result<Self, Error> {
        let geometry = geo::Geometry::<f64>::try_from_wkt_str(wkt)
            .map_err(|e| Error::InvalidData(format!("Invalid WKT: {e}")))?;
        Ok(Self::new(single_polygon(geometry)?, crs))
    }

    /// True if the point, given in `point_crs`, lies strictly inside the zone
    pub fn contains(&self, point: Point<f64>, point_crs: Crs) -> bool {
        self.polygon.contains(&point_crs.transform(point, self.crs))
    }
}

fn single_polygon(geometry: geo::Geometry<f64>) -> Result<Polygon<f64>, Error> {
    let mut polygons = match geometry {
        geo::Geometry::Polygon(polygon) => return Ok(polygon),
        geo::Geometry::MultiPolygon(multi) => multi.0,
        _ => Vec::new(),
    };
    match polygons.pop() {
        Some(polygon) if polygons.is_empty() => Ok(polygon),
        _ => Err(Error::InvalidData(
            "The operating zone must be a single polygon".to_string(),
        )),
    }
}

/// Analysis zone that trips can be aggregated to
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub zone_id: String,
    pub geometry: MultiPolygon<f64>,
}

impl Zone {
    pub fn new(zone_id: impl Into<String>, geometry: impl Into<MultiPolygon<f64>>) -> Self {
        Self {
            zone_id: zone_id.into(),
            geometry: geometry.into(),
        }
    }

    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.geometry.contains(point)
    }

    pub(crate) fn try_from_geometry(
        zone_id: String,
        geometry: geo::Geometry<f64>,
    ) -> Result<Self, Error> {
        match geometry {
            geo::Geometry::Polygon(polygon) => Ok(Self::new(zone_id, polygon)),
            geo::Geometry::MultiPolygon(multi) => Ok(Self::new(zone_id, multi)),
            _ => Err(Error::InvalidData(format!(
                "Zone `{zone_id}` is not a (multi)polygon"
            ))),
        }
    }
}
