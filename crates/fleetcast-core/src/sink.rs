//! Destination for produced vehicle positions.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::VehiclePosition;

/// Something that accepts vehicle positions, normally the broadcast hub.
///
/// Simulations publish through this trait so they never hold a concrete
/// hub type.
#[async_trait]
pub trait PositionSink: Send + Sync {
    /// Publish a new position for a vehicle.
    async fn publish(&self, position: VehiclePosition) -> Result<()>;

    /// Remove a vehicle and notify observers.
    async fn retire(&self, vehicle_id: &str) -> Result<()>;
}
