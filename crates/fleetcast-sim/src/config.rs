//! Simulation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Simulation timing and route sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Interval between position updates.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Maximum concurrently running simulations.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Radius of the circle road loops are routed around.
    #[serde(default = "default_road_radius_m")]
    pub road_radius_m: f64,
    /// Length of rail line followed by rail vehicles.
    #[serde(default = "default_rail_length_m")]
    pub rail_length_m: f64,
}

fn default_update_interval_ms() -> u64 {
    1_000
}

fn default_max_sessions() -> usize {
    64
}

fn default_road_radius_m() -> f64 {
    800.0
}

fn default_rail_length_m() -> f64 {
    4_000.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            max_sessions: default_max_sessions(),
            road_radius_m: default_road_radius_m(),
            rail_length_m: default_rail_length_m(),
        }
    }
}

impl SimulationConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.update_interval_ms == 0 {
            return Err("update_interval_ms must be positive".to_string());
        }
        for (name, value) in [
            ("road_radius_m", self.road_radius_m),
            ("rail_length_m", self.rail_length_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} ({value}) must be positive"));
            }
        }
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(SimulationConfig::default().validate().is_ok());

        let zero_interval = SimulationConfig {
            update_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert!(zero_interval.validate().is_err());

        let negative_radius = SimulationConfig {
            road_radius_m: -1.0,
            ..SimulationConfig::default()
        };
        assert!(negative_radius.validate().is_err());
    }
}
