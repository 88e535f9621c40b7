//! fleetcast application.
//!
//! Wires the components together:
//! - Broadcast hub and its WebSocket endpoint
//! - Route provider backed by the configured routing services
//! - Simulation orchestrator publishing into the hub
//! - Staleness sweep, metrics endpoint and graceful shutdown

pub mod app;
pub mod config;
pub mod error;
pub mod routes;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
