//! Prometheus metrics for fleetcast.
//!
//! Covers:
//! - Hub connections and subscribers
//! - Accepted, rejected and broadcast position updates
//! - Outbound queue overflow
//! - Route fetches by mode and outcome
//! - Active simulations
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup bug. These panics only occur
//! during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

use crate::error::TelemetryResult;

/// Currently open hub connections.
pub static CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "fleetcast_connections_active",
        "Currently open hub connections"
    )
    .unwrap()
});

/// Connections refused because the limit was reached.
pub static CONNECTIONS_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "fleetcast_connections_rejected_total",
        "Connections refused at the connection limit"
    )
    .unwrap()
});

/// Connections currently subscribed to broadcasts.
pub static SUBSCRIBERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "fleetcast_subscribers",
        "Connections subscribed to broadcasts"
    )
    .unwrap()
});

/// Vehicles currently held in the registry.
pub static REGISTRY_VEHICLES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "fleetcast_registry_vehicles",
        "Vehicles in the position registry"
    )
    .unwrap()
});

/// Position updates accepted into the registry.
pub static UPDATES_ACCEPTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "fleetcast_updates_accepted_total",
        "Position updates accepted into the registry"
    )
    .unwrap()
});

/// Inbound messages rejected.
/// Labels: reason (malformed/latitude/longitude/bearing/speed/...)
pub static UPDATES_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fleetcast_updates_rejected_total",
        "Inbound messages rejected by validation",
        &["reason"]
    )
    .unwrap()
});

/// Messages enqueued to subscribers.
/// Labels: event (update_location/vehicle_removed)
pub static BROADCAST_MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fleetcast_broadcast_messages_total",
        "Messages enqueued to subscriber connections",
        &["event"]
    )
    .unwrap()
});

/// Messages discarded from full outbound queues.
pub static MESSAGES_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "fleetcast_messages_dropped_total",
        "Oldest messages discarded from full outbound queues"
    )
    .unwrap()
});

/// Vehicles removed from the registry.
/// Labels: reason (stale/retired)
pub static VEHICLES_REMOVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fleetcast_vehicles_removed_total",
        "Vehicles removed from the registry",
        &["reason"]
    )
    .unwrap()
});

/// Route fetches.
/// Labels: mode (road/rail), outcome (live/cached/fallback)
pub static ROUTE_FETCH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fleetcast_route_fetch_total",
        "Route fetches by mode and outcome",
        &["mode", "outcome"]
    )
    .unwrap()
});

/// Route fetch latency in milliseconds, including fallback generation.
pub static ROUTE_FETCH_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "fleetcast_route_fetch_latency_ms",
        "Route fetch latency in milliseconds",
        &["mode"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0]
    )
    .unwrap()
});

/// Running simulations.
pub static SIMULATIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "fleetcast_simulations_active",
        "Running vehicle simulations"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a connection opened.
    pub fn connection_opened() {
        CONNECTIONS_ACTIVE.inc();
    }

    /// Record a connection closed.
    pub fn connection_closed() {
        CONNECTIONS_ACTIVE.dec();
    }

    /// Record a connection refused at the limit.
    pub fn connection_rejected() {
        CONNECTIONS_REJECTED_TOTAL.inc();
    }

    pub fn subscribers_set(count: usize) {
        SUBSCRIBERS.set(count as i64);
    }

    pub fn registry_size_set(count: usize) {
        REGISTRY_VEHICLES.set(count as i64);
    }

    /// Record an accepted position update.
    pub fn update_accepted() {
        UPDATES_ACCEPTED_TOTAL.inc();
    }

    /// Record a rejected inbound message.
    pub fn update_rejected(reason: &str) {
        UPDATES_REJECTED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record messages enqueued to `recipients` connections.
    pub fn broadcast(event: &str, recipients: usize) {
        BROADCAST_MESSAGES_TOTAL
            .with_label_values(&[event])
            .inc_by(recipients as u64);
    }

    /// Record messages dropped from a full outbound queue.
    pub fn messages_dropped(count: u64) {
        MESSAGES_DROPPED_TOTAL.inc_by(count);
    }

    /// Record vehicles removed from the registry.
    pub fn vehicles_removed(reason: &str, count: usize) {
        VEHICLES_REMOVED_TOTAL
            .with_label_values(&[reason])
            .inc_by(count as u64);
    }

    /// Record a route fetch outcome and its latency.
    pub fn route_fetch(mode: &str, outcome: &str, latency_ms: f64) {
        ROUTE_FETCH_TOTAL.with_label_values(&[mode, outcome]).inc();
        ROUTE_FETCH_LATENCY_MS
            .with_label_values(&[mode])
            .observe(latency_ms);
    }

    pub fn simulation_started() {
        SIMULATIONS_ACTIVE.inc();
    }

    pub fn simulation_stopped() {
        SIMULATIONS_ACTIVE.dec();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_touched_metrics() {
        Metrics::update_accepted();
        Metrics::update_rejected("latitude");
        Metrics::route_fetch("road", "fallback", 12.0);

        let text = Metrics::render().unwrap();
        assert!(text.contains("fleetcast_updates_accepted_total"));
        assert!(text.contains("fleetcast_updates_rejected_total{reason=\"latitude\"}"));
        assert!(text.contains("fleetcast_route_fetch_total"));
    }

    #[test]
    fn test_rejected_counter_increments() {
        let before = UPDATES_REJECTED_TOTAL.with_label_values(&["bearing"]).get();
        Metrics::update_rejected("bearing");
        let after = UPDATES_REJECTED_TOTAL.with_label_values(&["bearing"]).get();
        assert_eq!(after, before + 1);
    }
}
