//! Locally generated paths used when a routing service is unavailable.

use fleetcast_core::geo::{destination, interpolate};
use fleetcast_core::{GeoPoint, RoutePath};

use crate::error::RouteResult;

/// Vertices of the fallback road loop.
pub const FALLBACK_LOOP_POINTS: usize = 8;

/// Target spacing between points of the fallback rail line.
pub const FALLBACK_LINE_SPACING_M: f64 = 100.0;

/// Regular octagon of `radius_m` around `center`, first vertex due north.
pub fn fallback_loop(center: GeoPoint, radius_m: f64) -> RouteResult<RoutePath> {
    let step = 360.0 / FALLBACK_LOOP_POINTS as f64;
    let points = (0..FALLBACK_LOOP_POINTS)
        .map(|i| destination(center, i as f64 * step, radius_m))
        .collect();
    Ok(RoutePath::synthetic(points)?)
}

/// Straight west-to-east line of `length_m` centered on `center`.
pub fn fallback_line(center: GeoPoint, length_m: f64) -> RouteResult<RoutePath> {
    let west = destination(center, 270.0, length_m / 2.0);
    let east = destination(center, 90.0, length_m / 2.0);
    let segments = ((length_m / FALLBACK_LINE_SPACING_M).ceil() as usize).max(1);
    let points = (0..=segments)
        .map(|i| interpolate(west, east, i as f64 / segments as f64))
        .collect();
    Ok(RoutePath::synthetic(points)?)
}
