//! Structured logging initialization.

use std::fmt;
use std::str::FromStr;

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON when `RUST_ENV=production`, pretty otherwise.
    #[default]
    Auto,
    Json,
    Pretty,
    /// Single-line text, for terminals and CI logs.
    Compact,
}

impl LogFormat {
    /// Replace `Auto` with a concrete layout given the value of `RUST_ENV`.
    pub fn resolve(self, rust_env: Option<&str>) -> Self {
        match self {
            Self::Auto if rust_env == Some("production") => Self::Json,
            Self::Auto => Self::Pretty,
            other => other,
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(TelemetryError::LoggingInit(format!(
                "unknown log format '{other}' (expected auto, json, pretty or compact)"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        };
        f.write_str(name)
    }
}

/// Filter from `RUST_LOG` if set, else from `default_level`.
///
/// A malformed `default_level` is an error; a malformed `RUST_LOG` falls
/// back to `default_level`.
pub fn build_filter(default_level: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| TelemetryError::LoggingInit(format!("log level '{default_level}': {e}")))
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `default_level`. Fails if a subscriber is
/// already installed.
pub fn init_logging(default_level: &str, format: LogFormat) -> TelemetryResult<()> {
    let env_filter = build_filter(default_level)?;
    let rust_env = std::env::var("RUST_ENV").ok();
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format.resolve(rust_env.as_deref()) {
        LogFormat::Json => registry
            .with(
                layer_fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(layer_fmt::layer().compact().with_target(false))
            .try_init(),
        LogFormat::Pretty | LogFormat::Auto => registry
            .with(
                layer_fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
