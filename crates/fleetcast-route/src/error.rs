//! Route error types.

use fleetcast_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Routing service error: {0}")]
    Service(String),

    #[error("No usable geometry: {0}")]
    NoGeometry(String),

    #[error("Route request timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid route request: {0}")]
    InvalidRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RouteResult<T> = Result<T, RouteError>;
