//! Route geometry followed by simulated vehicles.

use crate::error::{CoreError, Result};
use crate::geo::{distance_m, polyline_length_m};
use crate::types::GeoPoint;

/// Consecutive points closer than this are treated as duplicates.
const DUPLICATE_TOLERANCE_M: f64 = 0.05;

/// An ordered, non-empty sequence of points along a road or rail line.
///
/// Paths produced from real geometry keep consecutive points close
/// together. Paths generated locally as a fallback are flagged
/// `synthetic` and may have long straight segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    points: Vec<GeoPoint>,
    synthetic: bool,
}

impl RoutePath {
    /// Build a path from fetched geometry.
    ///
    /// Consecutive duplicate points are collapsed.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self> {
        Self::build(points, false)
    }

    /// Build a locally generated fallback path.
    pub fn synthetic(points: Vec<GeoPoint>) -> Result<Self> {
        Self::build(points, true)
    }

    fn build(mut points: Vec<GeoPoint>, synthetic: bool) -> Result<Self> {
        points.dedup_by(|next, prev| distance_m(*prev, *next) < DUPLICATE_TOLERANCE_M);
        if points.is_empty() {
            return Err(CoreError::EmptyRoute);
        }
        Ok(Self { points, synthetic })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn first(&self) -> GeoPoint {
        self.points[0]
    }

    pub fn last(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    /// Point at `index`, wrapping around the end of the path.
    pub fn point_wrapping(&self, index: usize) -> GeoPoint {
        self.points[index % self.points.len()]
    }

    /// Length of the open polyline in meters.
    pub fn length_m(&self) -> f64 {
        polyline_length_m(&self.points)
    }

    /// Length of one lap including the closing segment back to the start.
    pub fn loop_length_m(&self) -> f64 {
        self.length_m() + distance_m(self.last(), self.first())
    }

    /// Whether the path ends where it starts.
    pub fn is_closed(&self, tolerance_m: f64) -> bool {
        self.points.len() > 1 && distance_m(self.first(), self.last()) <= tolerance_m
    }

    /// Consecutive pairs further apart than `threshold_m`.
    ///
    /// Returns `(index, distance)` where `index` is the first point of the pair.
    pub fn jumps_over(&self, threshold_m: f64) -> Vec<(usize, f64)> {
        self.points
            .windows(2)
            .enumerate()
            .map(|(i, w)| (i, distance_m(w[0], w[1])))
            .filter(|(_, d)| *d > threshold_m)
            .collect()
    }

    /// The path followed forward and then back to its start.
    ///
    /// Turns an open line into a loop without a long closing jump.
    #[must_use]
    pub fn out_and_back(&self) -> Self {
        let mut points = self.points.clone();
        points.extend(self.points.iter().rev().skip(1));
        Self {
            points,
            synthetic: self.synthetic,
        }
    }
}
