//! Hub error types.

use fleetcast_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit {0})")]
    ResourceExhausted(usize),

    #[error("Invalid position update: {0}")]
    Validation(#[from] CoreError),

    #[error("Hub dispatch task stopped")]
    Closed,
}

pub type HubResult<T> = Result<T, HubError>;
