//! Great-circle navigation math.
//!
//! All functions use a spherical earth model, which is accurate to well
//! under a percent at the street and rail scales the simulator works at.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees true (0-360, 0=north, 90=east)
//! - Distance: meters

use std::f64::consts::PI;

use crate::types::GeoPoint;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Great-circle distance between two points in meters (haversine).
pub fn distance_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.lat * DEG_TO_RAD;
    let lat2_rad = to.lat * DEG_TO_RAD;
    let delta_lat = (to.lat - from.lat) * DEG_TO_RAD;
    let delta_lng = (to.lng - from.lng) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing (forward azimuth) from one point to another.
///
/// Returns degrees in `[0, 360)`. Identical points yield 0.
pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f32 {
    if from == to {
        return 0.0;
    }

    let lat1_rad = from.lat * DEG_TO_RAD;
    let lat2_rad = to.lat * DEG_TO_RAD;
    let delta_lng = (to.lng - from.lng) * DEG_TO_RAD;

    let y = delta_lng.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lng.cos();

    let bearing = (y.atan2(x) * RAD_TO_DEG).rem_euclid(360.0) as f32;
    // rem_euclid can round up to exactly 360.0 after the f32 cast
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Linear interpolation between two points, `fraction` in `[0, 1]`.
pub fn interpolate(from: GeoPoint, to: GeoPoint, fraction: f64) -> GeoPoint {
    let t = fraction.clamp(0.0, 1.0);
    GeoPoint::new(
        from.lat + (to.lat - from.lat) * t,
        from.lng + (to.lng - from.lng) * t,
    )
}

/// Project a point along a bearing for a given distance.
pub fn destination(origin: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let lat1_rad = origin.lat * DEG_TO_RAD;
    let lng1_rad = origin.lng * DEG_TO_RAD;
    let bearing_rad = bearing_deg * DEG_TO_RAD;
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1_rad.sin();
    let cos_lat1 = lat1_rad.cos();
    let sin_d = angular_distance.sin();
    let cos_d = angular_distance.cos();

    let lat2_rad = (sin_lat1 * cos_d + cos_lat1 * sin_d * bearing_rad.cos()).asin();
    let lng2_rad =
        lng1_rad + (bearing_rad.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2_rad.sin());

    let mut lng2 = lng2_rad * RAD_TO_DEG;
    if lng2 > 180.0 {
        lng2 -= 360.0;
    } else if lng2 < -180.0 {
        lng2 += 360.0;
    }

    GeoPoint::new(lat2_rad * RAD_TO_DEG, lng2)
}

/// Total length of a polyline in meters.
pub fn polyline_length_m(points: &[GeoPoint]) -> f64 {
    points.windows(2).map(|w| distance_m(w[0], w[1])).sum()
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Box that contains a circle of `radius_m` around `center`.
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let north = destination(center, 0.0, radius_m);
        let south = destination(center, 180.0, radius_m);
        let east = destination(center, 90.0, radius_m);
        let west = destination(center, 270.0, radius_m);
        Self {
            south: south.lat,
            west: west.lng,
            north: north.lat,
            east: east.lng,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }
}
