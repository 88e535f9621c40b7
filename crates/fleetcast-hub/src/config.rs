//! Hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Broadcast hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Maximum concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Outbound queue depth per connection. The oldest message is dropped on overflow.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Vehicles not updated for this long are removed by the sweep.
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
    /// Interval between staleness sweeps.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Do not send an update back to the connection that reported it.
    #[serde(default)]
    pub suppress_self_echo: bool,
    /// Send the current registry to a connection when it first subscribes.
    #[serde(default = "default_replay_on_subscribe")]
    pub replay_on_subscribe: bool,
    /// Recent positions kept per vehicle.
    #[serde(default = "default_trail_len")]
    pub trail_len: usize,
    /// Capacity of the dispatch command channel.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

fn default_max_connections() -> usize {
    1024
}

fn default_queue_depth() -> usize {
    64
}

fn default_stale_after_ms() -> u64 {
    30_000
}

fn default_sweep_interval_ms() -> u64 {
    5_000
}

fn default_replay_on_subscribe() -> bool {
    true
}

fn default_trail_len() -> usize {
    32
}

fn default_command_capacity() -> usize {
    1024
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            queue_depth: default_queue_depth(),
            stale_after_ms: default_stale_after_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            suppress_self_echo: false,
            replay_on_subscribe: default_replay_on_subscribe(),
            trail_len: default_trail_len(),
            command_capacity: default_command_capacity(),
        }
    }
}

impl HubConfig {
    /// Validate configuration values.
    ///
    /// Rejects a zero sweep interval, a zero or out-of-range staleness
    /// threshold and a zero queue depth.
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_ms == 0 {
            return Err("sweep_interval_ms must be positive".to_string());
        }
        if self.stale_after_ms == 0 || i64::try_from(self.stale_after_ms).is_err() {
            return Err(format!(
                "stale_after_ms ({}) must be between 1 and {}",
                self.stale_after_ms,
                i64::MAX
            ));
        }
        if self.queue_depth == 0 {
            return Err("queue_depth must be positive".to_string());
        }
        if self.command_capacity == 0 {
            return Err("command_capacity must be positive".to_string());
        }
        Ok(())
    }

    /// Interval between sweeps, never shorter than 1 ms.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}
