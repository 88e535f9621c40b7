//! Trajectory of one simulated vehicle.
//!
//! The vehicle follows segment `i` from `path[i]` to `path[(i + 1) % n]`,
//! so every path is driven as a loop. Each tick advances by
//! `speed_kmh / 3.6 * interval_s` meters; distance left over at the end of
//! a segment carries into the next one.

use fleetcast_core::geo::{bearing_deg, distance_m, interpolate};
use fleetcast_core::{CoreError, GeoPoint, RoutePath, VehiclePosition, VehicleType};

use crate::error::{SimError, SimResult};

/// Segments shorter than this are skipped.
const MIN_SEGMENT_M: f64 = 1e-6;

/// Mutable state of a running simulation. Owned by a single task.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    vehicle_id: String,
    vehicle_type: VehicleType,
    path: RoutePath,
    speed_kmh: f32,
    update_interval_ms: u64,
    segment_index: usize,
    /// Fraction of the current segment covered, in `[0, 1)`.
    progress: f64,
    /// Forward azimuth of the current segment.
    bearing: f32,
    driver_name: Option<String>,
}

impl SimulationSession {
    /// Create a session at the start of `path`.
    ///
    /// Rejects paths with fewer than two points.
    pub fn new(
        vehicle_id: impl Into<String>,
        vehicle_type: VehicleType,
        path: RoutePath,
        speed_kmh: f32,
        update_interval_ms: u64,
    ) -> SimResult<Self> {
        if path.len() < 2 {
            return Err(CoreError::RouteTooShort(path.len()).into());
        }
        if !speed_kmh.is_finite() || speed_kmh < 0.0 {
            return Err(CoreError::InvalidSpeed(speed_kmh).into());
        }
        if update_interval_ms == 0 {
            return Err(SimError::InvalidRequest(
                "update interval must be positive".to_string(),
            ));
        }

        let mut session = Self {
            vehicle_id: vehicle_id.into(),
            vehicle_type,
            path,
            speed_kmh,
            update_interval_ms,
            segment_index: 0,
            progress: 0.0,
            bearing: 0.0,
            driver_name: None,
        };
        session.bearing = session.segment_bearing();
        Ok(session)
    }

    #[must_use]
    pub fn with_driver(mut self, name: Option<String>) -> Self {
        self.driver_name = name;
        self
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn bearing(&self) -> f32 {
        self.bearing
    }

    /// Meters covered per tick.
    pub fn step_distance_m(&self) -> f64 {
        f64::from(self.speed_kmh) / 3.6 * (self.update_interval_ms as f64 / 1000.0)
    }

    /// Advance one tick and return the new position stamped `now_ms`.
    pub fn tick(&mut self, now_ms: i64) -> VehiclePosition {
        self.advance_distance(self.step_distance_m());
        self.position(now_ms)
    }

    /// Current interpolated position.
    pub fn position(&self, now_ms: i64) -> VehiclePosition {
        let (from, to) = self.segment_endpoints(self.segment_index);
        let mut position = VehiclePosition::new(
            self.vehicle_id.clone(),
            self.vehicle_type,
            interpolate(from, to, self.progress),
            self.speed_kmh,
            self.bearing,
            now_ms,
        );
        position.driver_name = self.driver_name.clone();
        position
    }

    /// Move `distance_m` meters along the loop.
    pub fn advance_distance(&mut self, distance_m: f64) {
        if distance_m.is_nan() || distance_m <= 0.0 {
            return;
        }

        let lap_m = self.path.loop_length_m();
        if lap_m < MIN_SEGMENT_M {
            return;
        }
        let mut remaining = distance_m % lap_m;
        let mut skipped = 0;

        while remaining > 0.0 {
            let segment_m = self.segment_length_m(self.segment_index);
            if segment_m < MIN_SEGMENT_M {
                skipped += 1;
                if skipped > self.path.len() {
                    return;
                }
                self.next_segment();
                continue;
            }
            skipped = 0;

            let left_m = (1.0 - self.progress) * segment_m;
            if remaining < left_m {
                self.progress += remaining / segment_m;
                return;
            }
            remaining -= left_m;
            self.next_segment();
        }
    }

    fn next_segment(&mut self) {
        self.segment_index = (self.segment_index + 1) % self.path.len();
        self.progress = 0.0;
        self.bearing = self.segment_bearing();
    }

    fn segment_endpoints(&self, index: usize) -> (GeoPoint, GeoPoint) {
        (
            self.path.point_wrapping(index),
            self.path.point_wrapping(index + 1),
        )
    }

    fn segment_length_m(&self, index: usize) -> f64 {
        let (from, to) = self.segment_endpoints(index);
        distance_m(from, to)
    }

    fn segment_bearing(&self) -> f32 {
        let (from, to) = self.segment_endpoints(self.segment_index);
        bearing_deg(from, to)
    }
}
