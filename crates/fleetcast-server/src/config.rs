//! Application configuration.

use std::path::Path;

use fleetcast_hub::HubConfig;
use fleetcast_route::RouteConfig;
use fleetcast_sim::SimulationConfig;
use fleetcast_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "FLEETCAST_CONFIG";

/// Configuration file used when neither `--config` nor `FLEETCAST_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP and WebSocket server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `auto`, `json`, `pretty` or `compact`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_format() -> String {
    LogFormat::Auto.to_string()
}

impl TelemetryConfig {
    pub fn log_format(&self) -> AppResult<LogFormat> {
        self.log_format
            .parse()
            .map_err(|e| AppError::Config(format!("[telemetry] {e}")))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Root configuration. Every section may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub route: RouteConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        let sections = [
            ("hub", self.hub.validate()),
            ("route", self.route.validate()),
            ("simulation", self.simulation.validate()),
        ];
        for (section, result) in sections {
            result.map_err(|e| AppError::Config(format!("[{section}] {e}")))?;
        }
        self.telemetry.log_format()?;
        Ok(())
    }

    /// Resolve and load the configuration.
    ///
    /// Path order: `cli_path`, then `FLEETCAST_CONFIG`, then
    /// `config/default.toml`. An explicitly named file must exist; a
    /// missing default file yields built-in defaults. Returns the config
    /// and a description of where it came from.
    pub fn load(cli_path: Option<String>) -> AppResult<(Self, String)> {
        Self::load_with(cli_path, std::env::var(CONFIG_ENV).ok(), DEFAULT_CONFIG_PATH)
    }

    fn load_with(
        cli_path: Option<String>,
        env_path: Option<String>,
        default_path: &str,
    ) -> AppResult<(Self, String)> {
        if let Some(path) = cli_path.or(env_path) {
            let config = Self::from_file(&path)?;
            return Ok((config, path));
        }
        if Path::new(default_path).exists() {
            let config = Self::from_file(default_path)?;
            return Ok((config, default_path.to_string()));
        }
        Ok((Self::default(), "built-in defaults".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.hub.queue_depth, 64);
        assert_eq!(config.hub.stale_after_ms, 30_000);
        assert!(!config.hub.suppress_self_echo);
        assert_eq!(config.route.request_timeout_ms, 15_000);
        assert_eq!(config.simulation.update_interval_ms, 1_000);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            bind_addr = "127.0.0.1:9000"

            [hub]
            suppress_self_echo = true
            queue_depth = 8

            [simulation]
            update_interval_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert!(config.hub.suppress_self_echo);
        assert_eq!(config.hub.queue_depth, 8);
        assert_eq!(config.hub.max_connections, 1024);
        assert_eq!(config.simulation.update_interval_ms, 250);
        assert_eq!(config.simulation.max_sessions, 64);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[hub]\nqueue_depth = \"many\""),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let err = AppConfig::from_toml("[hub]\nsweep_interval_ms = 0").unwrap_err();
        assert!(err.to_string().contains("sweep_interval_ms"), "got {err}");
    }

    #[test]
    fn test_zero_stale_threshold_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[hub]\nstale_after_ms = 0"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_zero_update_interval_rejected() {
        let err = AppConfig::from_toml("[simulation]\nupdate_interval_ms = 0").unwrap_err();
        assert!(err.to_string().contains("[simulation]"), "got {err}");
    }

    #[test]
    fn test_log_format() {
        let config = AppConfig::from_toml("[telemetry]\nlog_format = \"compact\"").unwrap();
        assert_eq!(config.telemetry.log_format().unwrap(), LogFormat::Compact);
        assert_eq!(
            AppConfig::default().telemetry.log_format().unwrap(),
            LogFormat::Auto
        );

        let err = AppConfig::from_toml("[telemetry]\nlog_format = \"xml\"").unwrap_err();
        assert!(err.to_string().contains("[telemetry]"), "got {err}");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = AppConfig::load_with(
            Some("/nonexistent/fleetcast.toml".to_string()),
            None,
            "/nonexistent/default.toml",
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let (config, source) =
            AppConfig::load_with(None, None, "/nonexistent/default.toml").unwrap();
        assert_eq!(source, "built-in defaults");
        assert_eq!(config.hub.trail_len, 32);
    }

    #[test]
    fn test_cli_path_wins_over_env() {
        let dir = std::env::temp_dir().join(format!("fleetcast-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let cli = dir.join("cli.toml");
        std::fs::write(&cli, "[server]\nbind_addr = \"127.0.0.1:1\"\n").unwrap();

        let (config, source) = AppConfig::load_with(
            Some(cli.display().to_string()),
            Some("/nonexistent/env.toml".to_string()),
            "/nonexistent/default.toml",
        )
        .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:1");
        assert_eq!(source, cli.display().to_string());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
