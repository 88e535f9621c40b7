//! Prometheus metrics and structured logging for fleetcast.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus metrics for connections, fan-out, routing and simulations

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{build_filter, init_logging, LogFormat};
pub use metrics::Metrics;
