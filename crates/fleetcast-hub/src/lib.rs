//! Position registry and WebSocket broadcast hub for fleetcast.
//!
//! Features:
//! - Single dispatch task owning all registry mutations and fan-out
//! - Per-connection bounded outbound queues that drop the oldest message
//! - axum WebSocket endpoint speaking the `WireMessage` JSON envelope
//! - Periodic sweep of stale vehicles

pub mod config;
pub mod error;
pub mod hub;
pub mod outbound;
pub mod registry;
pub mod server;
pub mod sweeper;

pub use config::HubConfig;
pub use error::{HubError, HubResult};
pub use hub::{spawn_hub, ConnectionHandle, ConnectionId, HubHandle, HubStats};
pub use outbound::OutboundQueue;
pub use registry::{PositionRegistry, TrailPoint};
pub use server::hub_router;
pub use sweeper::run_sweeper;
