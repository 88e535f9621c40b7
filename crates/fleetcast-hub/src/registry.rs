//! Authoritative map of vehicle id to last known position.

use std::collections::{HashMap, VecDeque};

use fleetcast_core::VehiclePosition;
use serde::Serialize;

/// One point of a vehicle's recent trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailPoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: i64,
}

impl From<&VehiclePosition> for TrailPoint {
    fn from(pos: &VehiclePosition) -> Self {
        Self {
            lat: pos.latitude,
            lng: pos.longitude,
            timestamp: pos.timestamp_ms,
        }
    }
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    position: VehiclePosition,
    trail: VecDeque<TrailPoint>,
}

/// Last known position of every vehicle plus a bounded trail.
///
/// Mutated only by the hub dispatch task.
#[derive(Debug)]
pub struct PositionRegistry {
    entries: HashMap<String, RegistryEntry>,
    trail_len: usize,
}

impl PositionRegistry {
    pub fn new(trail_len: usize) -> Self {
        Self {
            entries: HashMap::new(),
            trail_len,
        }
    }

    /// Replace the record for `position.vehicle_id`. Returns true for a new vehicle.
    pub fn upsert(&mut self, position: VehiclePosition) -> bool {
        let point = TrailPoint::from(&position);
        match self.entries.get_mut(&position.vehicle_id) {
            Some(entry) => {
                entry.position = position;
                push_bounded(&mut entry.trail, point, self.trail_len);
                false
            }
            None => {
                let mut trail = VecDeque::with_capacity(self.trail_len);
                push_bounded(&mut trail, point, self.trail_len);
                self.entries
                    .insert(position.vehicle_id.clone(), RegistryEntry { position, trail });
                true
            }
        }
    }

    pub fn remove(&mut self, vehicle_id: &str) -> Option<VehiclePosition> {
        self.entries.remove(vehicle_id).map(|e| e.position)
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&VehiclePosition> {
        self.entries.get(vehicle_id).map(|e| &e.position)
    }

    /// Copy of every position, sorted by vehicle id.
    pub fn snapshot(&self) -> Vec<VehiclePosition> {
        let mut positions: Vec<VehiclePosition> =
            self.entries.values().map(|e| e.position.clone()).collect();
        positions.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        positions
    }

    /// Trail of a vehicle, oldest first.
    pub fn trail(&self, vehicle_id: &str) -> Option<Vec<TrailPoint>> {
        self.entries
            .get(vehicle_id)
            .map(|e| e.trail.iter().copied().collect())
    }

    /// Remove entries whose timestamp is older than `now_ms - max_age_ms`.
    ///
    /// Returns removed ids, sorted.
    pub fn sweep_stale(&mut self, max_age_ms: i64, now_ms: i64) -> Vec<String> {
        let cutoff = now_ms.saturating_sub(max_age_ms);
        let mut removed: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.position.timestamp_ms < cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &removed {
            self.entries.remove(id);
        }
        removed.sort();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn push_bounded(trail: &mut VecDeque<TrailPoint>, point: TrailPoint, max: usize) {
    if max == 0 {
        return;
    }
    while trail.len() >= max {
        trail.pop_front();
    }
    trail.push_back(point);
}
