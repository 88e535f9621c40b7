//! Vehicle and geographic domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Current wall-clock time in Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================================
// VehicleType
// ============================================================================

/// Kind of vehicle reporting positions.
///
/// Serialized upper case (`"METRO"`); parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VehicleType {
    Car,
    Bus,
    Minibus,
    Metro,
    Taxi,
    Motorcycle,
}

impl VehicleType {
    /// All known vehicle types.
    pub const ALL: [VehicleType; 6] = [
        Self::Car,
        Self::Bus,
        Self::Minibus,
        Self::Metro,
        Self::Taxi,
        Self::Motorcycle,
    ];

    /// Wire name of the vehicle type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "CAR",
            Self::Bus => "BUS",
            Self::Minibus => "MINIBUS",
            Self::Metro => "METRO",
            Self::Taxi => "TAXI",
            Self::Motorcycle => "MOTORCYCLE",
        }
    }

    /// Whether this vehicle follows rail geometry instead of streets.
    pub fn is_rail(&self) -> bool {
        matches!(self, Self::Metro)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| CoreError::UnknownVehicleType(s.to_string()))
    }
}

impl TryFrom<String> for VehicleType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VehicleType> for String {
    fn from(value: VehicleType) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// GeoPoint
// ============================================================================

/// A WGS-84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that latitude and longitude are within their valid ranges.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoreError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoreError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

// ============================================================================
// VehiclePosition
// ============================================================================

/// Last known state of a vehicle.
///
/// Identity is `vehicle_id`. Records are always replaced whole; there is
/// no partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePosition {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f32,
    /// Heading in degrees, 0 = north, clockwise, in `[0, 360)`.
    pub bearing_deg: f32,
    /// Report time (Unix ms).
    pub timestamp_ms: i64,
    pub driver_name: Option<String>,
    pub driver_photo_ref: Option<String>,
}

impl VehiclePosition {
    /// Create a position without driver details.
    pub fn new(
        vehicle_id: impl Into<String>,
        vehicle_type: VehicleType,
        point: GeoPoint,
        speed_kmh: f32,
        bearing_deg: f32,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            vehicle_type,
            latitude: point.lat,
            longitude: point.lng,
            speed_kmh,
            bearing_deg,
            timestamp_ms,
            driver_name: None,
            driver_photo_ref: None,
        }
    }

    /// Attach a driver name.
    #[must_use]
    pub fn with_driver(mut self, name: impl Into<String>) -> Self {
        self.driver_name = Some(name.into());
        self
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Age of this report relative to `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }

    /// Validate an inbound report.
    ///
    /// Rejects an empty id, out-of-range coordinates, a bearing outside
    /// `[0, 360)` and negative or non-finite speed. NaN fails every range
    /// check.
    pub fn validate(&self) -> Result<()> {
        if self.vehicle_id.trim().is_empty() {
            return Err(CoreError::EmptyVehicleId);
        }
        self.point().validate()?;
        if !(0.0..360.0).contains(&self.bearing_deg) {
            return Err(CoreError::BearingOutOfRange(self.bearing_deg));
        }
        if !self.speed_kmh.is_finite() || self.speed_kmh < 0.0 {
            return Err(CoreError::InvalidSpeed(self.speed_kmh));
        }
        Ok(())
    }
}
