//! Vehicle trajectory simulation.
//!
//! - `SimulationSession`: advances a vehicle along a looping path at a
//!   constant real-world pace
//! - `SimulationOrchestrator`: fetches routes, runs one task per simulated
//!   vehicle and publishes through a `PositionSink`

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod status;

pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use orchestrator::{SimulationInfo, SimulationOrchestrator, SimulationRequest};
pub use session::SimulationSession;
pub use status::SimulationStatus;
