//! Route provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// External routing services and caching parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Base URL of the OSRM-compatible road router.
    #[serde(default = "default_osrm_url")]
    pub osrm_url: String,
    /// Overpass-compatible interpreter endpoint.
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    /// Hard timeout for a single route request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long live routes are reused.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Consecutive points further apart than this are logged as gaps.
    #[serde(default = "default_max_jump_m")]
    pub max_jump_m: f64,
    /// Half-size of the box searched for rail ways.
    #[serde(default = "default_rail_search_radius_m")]
    pub rail_search_radius_m: f64,
    /// User-Agent header sent to both services.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_osrm_url() -> String {
    "https://router.project-osrm.org".to_string()
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_jump_m() -> f64 {
    500.0
}

fn default_rail_search_radius_m() -> f64 {
    2_000.0
}

fn default_user_agent() -> String {
    concat!("fleetcast/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            osrm_url: default_osrm_url(),
            overpass_url: default_overpass_url(),
            request_timeout_ms: default_request_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_jump_m: default_max_jump_m(),
            rail_search_radius_m: default_rail_search_radius_m(),
            user_agent: default_user_agent(),
        }
    }
}

impl RouteConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be positive".to_string());
        }
        for (name, value) in [
            ("max_jump_m", self.max_jump_m),
            ("rail_search_radius_m", self.rail_search_radius_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} ({value}) must be positive"));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
