//! Core domain types for the fleetcast position hub.
//!
//! This crate provides the types shared by every other fleetcast crate:
//! - `VehiclePosition`, `VehicleType`: the last known state of a vehicle
//! - `GeoPoint`, `RoutePath`: geometry followed by simulated vehicles
//! - `WireMessage`: the JSON envelope spoken over WebSocket connections
//! - `PositionSink`: the seam between position producers and the hub
//! - `geo`: great-circle distance, forward azimuth and interpolation

pub mod error;
pub mod geo;
pub mod message;
pub mod route;
pub mod sink;
pub mod types;

pub use error::{CoreError, Result};
pub use geo::BoundingBox;
pub use message::{PositionPayload, WireMessage};
pub use route::RoutePath;
pub use sink::PositionSink;
pub use types::{now_ms, GeoPoint, VehiclePosition, VehicleType};
