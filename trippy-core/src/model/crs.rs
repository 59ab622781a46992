//! Coordinate reference systems supported for zone membership tests.
//!
//! Only geographic WGS84 and the UTM families commonly used by simulation
//! outputs are covered. Transformations run through geographic coordinates
//! with the transverse Mercator series (Snyder, USGS PP 1395).

use std::fmt;
use std::str::FromStr;

use geo::Point;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datum {
    /// ETRS89, GRS80 ellipsoid
    Etrs89,
    Wgs84,
}

impl Datum {
    fn semi_major_axis(self) -> f64 {
        6_378_137.0
    }

    fn flattening(self) -> f64 {
        match self {
            Datum::Etrs89 => 1.0 / 298.257_222_101,
            Datum::Wgs84 => 1.0 / 298.257_223_563,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326, x = longitude, y = latitude in degrees
    Wgs84,
    /// EPSG:258NN, EPSG:326NN and EPSG:327NN
    Utm { zone: u8, north: bool, datum: Datum },
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Utm {
                zone,
                datum: Datum::Etrs89,
                ..
            } => 25800 + u32::from(zone),
            Crs::Utm {
                zone, north: true, ..
            } => 32600 + u32::from(zone),
            Crs::Utm { zone, .. } => 32700 + u32::from(zone),
        }
    }

    /// Transform a point from this CRS into `target`
    pub fn transform(self, point: Point<f64>, target: Crs) -> Point<f64> {
        if self == target {
            return point;
        }
        let (lon, lat) = match self {
            Crs::Wgs84 => (point.x(), point.y()),
            Crs::Utm { zone, north, datum } => utm_to_geographic(point, zone, north, datum),
        };
        match target {
            Crs::Wgs84 => Point::new(lon, lat),
            Crs::Utm { zone, north, datum } => geographic_to_utm(lon, lat, zone, north, datum),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epsg:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || Error::InvalidArgument(format!("Unsupported CRS `{s}`"));
        let code: u32 = s
            .trim()
            .to_ascii_lowercase()
            .strip_prefix("epsg:")
            .and_then(|code| code.parse().ok())
            .ok_or_else(unsupported)?;

        let utm = |base: u32, north: bool, datum: Datum| {
            u8::try_from(code - base)
                .ok()
                .filter(|zone| (1..=60).contains(zone))
                .map(|zone| Crs::Utm { zone, north, datum })
                .ok_or_else(unsupported)
        };

        match code {
            4326 => Ok(Crs::Wgs84),
            25801..=25860 => utm(25800, true, Datum::Etrs89),
            32601..=32660 => utm(32600, true, Datum::Wgs84),
            32701..=32760 => utm(32700, false, Datum::Wgs84),
            _ => Err(unsupported()),
        }
    }
}

impl Serialize for Crs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Crs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn central_meridian(zone: u8) -> f64 {
    (f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0
}

struct Ellipsoid {
    a: f64,
    e2: f64,
    ep2: f64,
}

impl Ellipsoid {
    fn of(datum: Datum) -> Self {
        let f = datum.flattening();
        let e2 = f * (2.0 - f);
        Self {
            a: datum.semi_major_axis(),
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    /// Meridional arc length from the equator to latitude `phi`
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }
}

fn geographic_to_utm(lon: f64, lat: f64, zone: u8, north: bool, datum: Datum) -> Point<f64> {
    let ell = Ellipsoid::of(datum);
    let phi = lat.to_radians();
    let lambda = (lon - central_meridian(zone)).to_radians();

    let (sin_phi, cos_phi) = phi.sin_cos();
    let n = ell.a / (1.0 - ell.e2 * sin_phi * sin_phi).sqrt();
    let t = phi.tan().powi(2);
    let c = ell.ep2 * cos_phi * cos_phi;
    let a = cos_phi * lambda;
    let m = ell.meridian_arc(phi);

    let x = SCALE_FACTOR
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ell.ep2) * a.powi(5) / 120.0)
        + FALSE_EASTING;
    let y = SCALE_FACTOR
        * (m + n
            * phi.tan()
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ell.ep2) * a.powi(6) / 720.0));
    let false_northing = if north { 0.0 } else { FALSE_NORTHING_SOUTH };

    Point::new(x, y + false_northing)
}

fn utm_to_geographic(point: Point<f64>, zone: u8, north: bool, datum: Datum) -> (f64, f64) {
    let ell = Ellipsoid::of(datum);
    let e2 = ell.e2;
    let x = point.x() - FALSE_EASTING;
    let y = if north {
        point.y()
    } else {
        point.y() - FALSE_NORTHING_SOUTH
    };

    let m = y / SCALE_FACTOR;
    let mu = m / (ell.a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let c1 = ell.ep2 * cos_phi1 * cos_phi1;
    let t1 = phi1.tan().powi(2);
    let n1 = ell.a / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = ell.a * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * SCALE_FACTOR);

    let phi = phi1
        - (n1 * phi1.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ell.ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * ell.ep2
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lambda = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ell.ep2 + 24.0 * t1 * t1)
            * d.powi(5)
            / 120.0)
        / cos_phi1;

    (
        central_meridian(zone) + lambda.to_degrees(),
        phi.to_degrees(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_codes() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!(
            "epsg:25833".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 33,
                north: true,
                datum: Datum::Etrs89
            }
        );
        assert_eq!("epsg:32733".parse::<Crs>().unwrap().epsg(), 32733);
        assert!("epsg:3857".parse::<Crs>().is_err());
        assert!("25833".parse::<Crs>().is_err());
    }

    #[test]
    fn central_meridian_maps_to_false_easting() {
        let utm33: Crs = "epsg:25833".parse().unwrap();
        let projected = Crs::Wgs84.transform(Point::new(15.0, 0.0), utm33);
        assert!((projected.x() - FALSE_EASTING).abs() < 1e-6);
        assert!(projected.y().abs() < 1e-6);
    }

    #[test]
    fn round_trip_through_utm() {
        let utm33: Crs = "epsg:25833".parse().unwrap();
        let berlin = Point::new(13.404_954, 52.520_008);
        let projected = Crs::Wgs84.transform(berlin, utm33);
        assert!(projected.x() > 350_000.0 && projected.x() < 450_000.0);
        assert!(projected.y() > 5_750_000.0 && projected.y() < 5_850_000.0);

        let back = utm33.transform(projected, Crs::Wgs84);
        assert!((back.x() - berlin.x()).abs() < 1e-6);
        assert!((back.y() - berlin.y()).abs() < 1e-6);
    }

    #[test]
    fn southern_hemisphere_uses_false_northing() {
        let utm23s: Crs = "epsg:32723".parse().unwrap();
        let rio = Point::new(-43.2, -22.9);
        let projected = Crs::Wgs84.transform(rio, utm23s);
        assert!(projected.y() > 7_000_000.0);
        let back = utm23s.transform(projected, Crs::Wgs84);
        assert!((back.x() - rio.x()).abs() < 1e-6);
        assert!((back.y() - rio.y()).abs() < 1e-6);
    }
}
