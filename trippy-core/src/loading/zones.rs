use geojson::{FeatureCollection, GeoJson};
use log::info;
use serde_json::Value;

use crate::model::Zone;
use crate::model::column::format_float;
use crate::Error;

/// Read analysis zones from a GeoJSON FeatureCollection.
///
/// The zone id is taken from the `id_property` of each feature and may be a
/// string or a number. Features without geometry are skipped.
///
/// # Errors
///
/// Returns an error if the input is not a FeatureCollection, a feature has
/// no id, or a geometry is not a (multi)polygon
pub fn zones_from_geojson(geojson: &str, id_property: &str) -> Result<Vec<Zone>, Error> {
    let parsed: GeoJson = geojson
        .parse()
        .map_err(|e| Error::InvalidData(format!("Invalid GeoJSON: {e}")))?;
    let collection = FeatureCollection::try_from(parsed)
        .map_err(|_| Error::InvalidData("Zones must be a GeoJSON FeatureCollection".to_string()))?;

    let mut zones = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.into_iter().enumerate() {
        let zone_id = match feature.property(id_property) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.as_f64().map_or_else(|| id.to_string(), format_float),
            _ => {
                return Err(Error::InvalidData(format!(
                    "Feature {idx} has no `{id_property}` property"
                )));
            }
        };
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let geometry = geo::Geometry::<f64>::try_from(geometry)
            .map_err(|e| Error::InvalidData(format!("Invalid geometry of zone `{zone_id}`: {e}")))?;
        zones.push(Zone::try_from_geometry(zone_id, geometry)?);
    }

    info!("Read {} zones", zones.len());
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;

    const ZONES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"zone": "center"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"zone": 7},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20, 0], [30, 0], [30, 10], [20, 10], [20, 0]]],
                        [[[40, 0], [50, 0], [50, 10], [40, 10], [40, 0]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn reads_polygons_and_multipolygons() {
        let zones = zones_from_geojson(ZONES, "zone").unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone_id, "center");
        assert_eq!(zones[1].zone_id, "7");
        assert!(zones[0].contains(&Point::new(5.0, 5.0)));
        assert!(zones[1].contains(&Point::new(45.0, 5.0)));
        assert!(!zones[1].contains(&Point::new(35.0, 5.0)));
    }

    #[test]
    fn missing_id_property() {
        let err = zones_from_geojson(ZONES, "name").unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn point_zones_are_rejected() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"zone": "a"},
                "geometry": {"type": "Point", "coordinates": [1, 1]}
            }]
        }"#;
        assert!(zones_from_geojson(json, "zone").is_err());
    }
}
