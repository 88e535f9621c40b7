//! Simulation error types.

use fleetcast_core::CoreError;
use fleetcast_route::RouteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Simulation already running: {0}")]
    AlreadyRunning(String),

    #[error("Simulation not found: {0}")]
    NotFound(String),

    #[error("Too many simulations (limit {0})")]
    ResourceExhausted(usize),

    #[error("Invalid simulation request: {0}")]
    InvalidRequest(String),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
