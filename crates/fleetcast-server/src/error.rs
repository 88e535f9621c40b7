//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Route error: {0}")]
    Route(#[from] fleetcast_route::RouteError),

    #[error("Hub error: {0}")]
    Hub(#[from] fleetcast_hub::HubError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] fleetcast_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
