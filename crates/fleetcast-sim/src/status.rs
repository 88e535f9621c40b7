//! Human-readable simulation status.

use std::fmt;

/// Lifecycle state of a simulated vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationStatus {
    /// Fetching the route.
    Connecting,
    /// Moving along a synthetic path after the routing service failed.
    UsingFallback,
    /// Moving along live route geometry.
    Running,
    Stopped,
    Error(String),
}

impl SimulationStatus {
    /// Whether the simulation is emitting positions.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::UsingFallback)
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("Connecting…"),
            Self::UsingFallback => f.write_str("Using fallback route…"),
            Self::Running => f.write_str("Running"),
            Self::Stopped => f.write_str("Stopped"),
            Self::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strings() {
        assert_eq!(SimulationStatus::Connecting.to_string(), "Connecting…");
        assert_eq!(
            SimulationStatus::UsingFallback.to_string(),
            "Using fallback route…"
        );
        assert_eq!(SimulationStatus::Running.to_string(), "Running");
        assert_eq!(
            SimulationStatus::Error("sink closed".to_string()).to_string(),
            "Error: sink closed"
        );
    }
}
