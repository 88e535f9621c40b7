//! Error types for fleetcast-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("Vehicle id must not be empty")]
    EmptyVehicleId,

    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),

    #[error("Bearing out of range: {0}")]
    BearingOutOfRange(f32),

    #[error("Invalid speed: {0}")]
    InvalidSpeed(f32),

    #[error("Unknown vehicle type: {0}")]
    UnknownVehicleType(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Route must contain at least one point")]
    EmptyRoute,

    #[error("Route too short for simulation: {0} point(s)")]
    RouteTooShort(usize),

    #[error("Position sink closed")]
    SinkClosed,
}

impl CoreError {
    /// Whether this error describes a malformed inbound message.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyVehicleId
                | Self::LatitudeOutOfRange(_)
                | Self::LongitudeOutOfRange(_)
                | Self::BearingOutOfRange(_)
                | Self::InvalidSpeed(_)
                | Self::UnknownVehicleType(_)
                | Self::InvalidMessage(_)
        )
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyVehicleId => "empty_vehicle_id",
            Self::LatitudeOutOfRange(_) => "latitude",
            Self::LongitudeOutOfRange(_) => "longitude",
            Self::BearingOutOfRange(_) => "bearing",
            Self::InvalidSpeed(_) => "speed",
            Self::UnknownVehicleType(_) => "vehicle_type",
            Self::InvalidMessage(_) => "malformed",
            Self::EmptyRoute => "empty_route",
            Self::RouteTooShort(_) => "route_too_short",
            Self::SinkClosed => "sink_closed",
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
