//! Broadcast hub actor.
//!
//! A single dispatch task (`BroadcastHub`) owns the connection set and is
//! the only writer of the position registry. Everything else talks to it
//! through a cloneable `HubHandle`.
//!
//! # State split
//!
//! - Dispatch state: connections, subscription flags, registry writes
//! - Handle state: a read lock on the shared registry for snapshots, and
//!   the connection semaphore, so reads never wait on the command channel
//!
//! # Delivery
//!
//! Each message is serialized once and the same `Arc<str>` is pushed to
//! every subscribed connection's `OutboundQueue`. Subscribers see updates
//! in the order the dispatch task processed them.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fleetcast_core::{now_ms, CoreError, PositionSink, VehiclePosition, WireMessage};
use fleetcast_telemetry::Metrics;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::HubConfig;
use crate::error::{HubError, HubResult};
use crate::outbound::OutboundQueue;
use crate::registry::{PositionRegistry, TrailPoint};

const EVENT_UPDATE: &str = "update_location";
const EVENT_REMOVED: &str = "vehicle_removed";

// ============================================================================
// Identifiers and snapshots
// ============================================================================

/// Opaque id of a hub connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Point-in-time hub counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub subscribers: usize,
    pub vehicles: usize,
}

/// A registered connection.
///
/// Holds one of the hub's connection permits; dropping it frees the permit
/// but does not unregister from the hub. Call `HubHandle::disconnect` first.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: Arc<OutboundQueue>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        Metrics::connection_closed();
    }
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue the writer drains.
    pub fn outbound(&self) -> Arc<OutboundQueue> {
        Arc::clone(&self.outbound)
    }

    /// Receive the next queued message.
    pub async fn recv(&self) -> Option<Arc<str>> {
        self.outbound.recv().await
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Commands processed by the dispatch task.
#[derive(Debug)]
pub enum HubCommand {
    Register {
        id: ConnectionId,
        outbound: Arc<OutboundQueue>,
    },
    Subscribe {
        id: ConnectionId,
    },
    /// Validated position; `origin` is the reporting connection, if any.
    Update {
        origin: Option<ConnectionId>,
        position: VehiclePosition,
    },
    Disconnect {
        id: ConnectionId,
    },
    RemoveVehicle {
        vehicle_id: String,
        reply: oneshot::Sender<bool>,
    },
    Sweep {
        now_ms: i64,
        reply: oneshot::Sender<Vec<String>>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Shutdown,
}

// ============================================================================
// BroadcastHub (dispatch task)
// ============================================================================

struct Connection {
    outbound: Arc<OutboundQueue>,
    subscribed: bool,
    replayed: bool,
}

/// Dispatch task state.
pub struct BroadcastHub {
    rx: mpsc::Receiver<HubCommand>,
    connections: HashMap<ConnectionId, Connection>,
    registry: Arc<RwLock<PositionRegistry>>,
    config: HubConfig,
}

impl BroadcastHub {
    /// Process commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        debug!("BroadcastHub started");

        while let Some(cmd) = self.rx.recv().await {
            if let HubCommand::Shutdown = cmd {
                debug!("BroadcastHub shutting down");
                break;
            }
            self.handle_command(cmd);
        }

        for conn in self.connections.values() {
            conn.outbound.close();
        }
        self.connections.clear();
        Metrics::subscribers_set(0);
        debug!("BroadcastHub terminated");
    }

    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Register { id, outbound } => {
                self.connections.insert(
                    id,
                    Connection {
                        outbound,
                        subscribed: false,
                        replayed: false,
                    },
                );
                debug!(connection = %id, total = self.connections.len(), "Connection registered");
            }
            HubCommand::Subscribe { id } => self.on_subscribe(id),
            HubCommand::Update { origin, position } => self.on_update(origin, position),
            HubCommand::Disconnect { id } => self.on_disconnect(id),
            HubCommand::RemoveVehicle { vehicle_id, reply } => {
                let removed = self.on_remove(&vehicle_id);
                let _ = reply.send(removed);
            }
            HubCommand::Sweep { now_ms, reply } => {
                let removed = self.on_sweep(now_ms);
                let _ = reply.send(removed);
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            HubCommand::Shutdown => {}
        }
    }

    fn on_subscribe(&mut self, id: ConnectionId) {
        let replay = self.config.replay_on_subscribe;
        let Some(conn) = self.connections.get_mut(&id) else {
            warn!(connection = %id, "Subscribe from unknown connection");
            return;
        };
        conn.subscribed = true;

        if replay && !conn.replayed {
            conn.replayed = true;
            let snapshot = self.registry.read().snapshot();
            for position in &snapshot {
                if let Some(message) = serialize(&WireMessage::update(position)) {
                    conn.outbound.push(message);
                }
            }
            debug!(connection = %id, vehicles = snapshot.len(), "Replayed registry snapshot");
        }

        Metrics::subscribers_set(self.subscriber_count());
        info!(connection = %id, subscribers = self.subscriber_count(), "Connection subscribed");
    }

    fn on_update(&mut self, origin: Option<ConnectionId>, position: VehiclePosition) {
        let Some(message) = serialize(&WireMessage::update(&position)) else {
            return;
        };

        let vehicles = {
            let mut registry = self.registry.write();
            if registry.upsert(position.clone()) {
                info!(
                    vehicle_id = %position.vehicle_id,
                    vehicle_type = %position.vehicle_type,
                    "Vehicle registered"
                );
            }
            registry.len()
        };
        Metrics::update_accepted();
        Metrics::registry_size_set(vehicles);

        let except = if self.config.suppress_self_echo {
            origin
        } else {
            None
        };
        let recipients = self.fan_out(&message, except);
        Metrics::broadcast(EVENT_UPDATE, recipients);
        trace!(vehicle_id = %position.vehicle_id, recipients, "Update broadcast");
    }

    fn on_disconnect(&mut self, id: ConnectionId) {
        if let Some(conn) = self.connections.remove(&id) {
            conn.outbound.close();
            let dropped = conn.outbound.dropped();
            Metrics::subscribers_set(self.subscriber_count());
            info!(
                connection = %id,
                dropped,
                remaining = self.connections.len(),
                "Connection removed"
            );
        }
    }

    fn on_remove(&mut self, vehicle_id: &str) -> bool {
        let (removed, vehicles) = {
            let mut registry = self.registry.write();
            (registry.remove(vehicle_id).is_some(), registry.len())
        };
        if removed {
            Metrics::registry_size_set(vehicles);
            Metrics::vehicles_removed("retired", 1);
            self.broadcast_removed(vehicle_id);
            info!(vehicle_id, "Vehicle retired");
        }
        removed
    }

    fn on_sweep(&mut self, now_ms: i64) -> Vec<String> {
        let max_age_ms = i64::try_from(self.config.stale_after_ms).unwrap_or(i64::MAX);
        let (removed, vehicles) = {
            let mut registry = self.registry.write();
            let removed = registry.sweep_stale(max_age_ms, now_ms);
            (removed, registry.len())
        };
        if !removed.is_empty() {
            Metrics::registry_size_set(vehicles);
            Metrics::vehicles_removed("stale", removed.len());
            for vehicle_id in &removed {
                self.broadcast_removed(vehicle_id);
            }
            info!(count = removed.len(), vehicles, "Stale vehicles removed");
        }
        removed
    }

    fn broadcast_removed(&self, vehicle_id: &str) {
        if let Some(message) = serialize(&WireMessage::removed(vehicle_id)) {
            let recipients = self.fan_out(&message, None);
            Metrics::broadcast(EVENT_REMOVED, recipients);
        }
    }

    /// Push `message` to every subscribed connection except `except`.
    fn fan_out(&self, message: &Arc<str>, except: Option<ConnectionId>) -> usize {
        let mut recipients = 0;
        for (id, conn) in &self.connections {
            if !conn.subscribed || Some(*id) == except {
                continue;
            }
            if conn.outbound.push(Arc::clone(message)) {
                recipients += 1;
            }
        }
        recipients
    }

    fn subscriber_count(&self) -> usize {
        self.connections.values().filter(|c| c.subscribed).count()
    }

    fn stats(&self) -> HubStats {
        HubStats {
            connections: self.connections.len(),
            subscribers: self.subscriber_count(),
            vehicles: self.registry.read().len(),
        }
    }
}

fn serialize(message: &WireMessage) -> Option<Arc<str>> {
    match message.to_json() {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize hub message");
            None
        }
    }
}

// ============================================================================
// HubHandle
// ============================================================================

/// Cloneable handle to the broadcast hub.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
    registry: Arc<RwLock<PositionRegistry>>,
    permits: Arc<Semaphore>,
    max_connections: usize,
    next_id: Arc<AtomicU64>,
    queue_depth: usize,
}

impl HubHandle {
    async fn send(&self, cmd: HubCommand) -> HubResult<()> {
        self.tx.send(cmd).await.map_err(|_| HubError::Closed)
    }

    /// Register a new connection.
    ///
    /// Fails with `ResourceExhausted` when the connection limit is reached.
    pub async fn connect(&self) -> HubResult<ConnectionHandle> {
        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| {
                Metrics::connection_rejected();
                HubError::ResourceExhausted(self.max_connections)
            })?;

        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let outbound = Arc::new(OutboundQueue::new(self.queue_depth));
        self.send(HubCommand::Register {
            id,
            outbound: Arc::clone(&outbound),
        })
        .await?;

        Metrics::connection_opened();
        Ok(ConnectionHandle {
            id,
            outbound,
            _permit: permit,
        })
    }

    /// Mark a connection as a broadcast recipient. Idempotent.
    pub async fn subscribe(&self, id: ConnectionId) -> HubResult<()> {
        self.send(HubCommand::Subscribe { id }).await
    }

    /// Validate and dispatch a position report.
    pub async fn report_update(
        &self,
        origin: Option<ConnectionId>,
        position: VehiclePosition,
    ) -> HubResult<()> {
        if let Err(e) = position.validate() {
            Metrics::update_rejected(e.reason());
            return Err(HubError::Validation(e));
        }
        self.send(HubCommand::Update { origin, position }).await
    }

    /// Unregister a connection. Its vehicles stay until swept.
    pub async fn disconnect(&self, id: ConnectionId) -> HubResult<()> {
        self.send(HubCommand::Disconnect { id }).await
    }

    /// Remove a vehicle and broadcast `vehicle_removed`. Returns false if unknown.
    pub async fn remove_vehicle(&self, vehicle_id: &str) -> HubResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::RemoveVehicle {
            vehicle_id: vehicle_id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Remove vehicles not updated within the staleness threshold.
    pub async fn sweep_stale(&self) -> HubResult<Vec<String>> {
        self.sweep_stale_at(now_ms()).await
    }

    /// Sweep relative to an explicit clock reading.
    pub async fn sweep_stale_at(&self, now_ms: i64) -> HubResult<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Sweep { now_ms, reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    pub async fn stats(&self) -> HubResult<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Consistent copy of the registry, sorted by vehicle id.
    pub fn snapshot(&self) -> Vec<VehiclePosition> {
        self.registry.read().snapshot()
    }

    pub fn trail(&self, vehicle_id: &str) -> Option<Vec<TrailPoint>> {
        self.registry.read().trail(vehicle_id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Connections currently holding a slot.
    pub fn connection_count(&self) -> usize {
        self.max_connections - self.permits.available_permits()
    }

    pub fn at_capacity(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// Stop the dispatch task. Every outbound queue is closed.
    pub async fn shutdown(&self) -> HubResult<()> {
        self.send(HubCommand::Shutdown).await
    }
}

#[async_trait]
impl PositionSink for HubHandle {
    async fn publish(&self, position: VehiclePosition) -> fleetcast_core::Result<()> {
        self.report_update(None, position)
            .await
            .map_err(|e| match e {
                HubError::Validation(err) => err,
                _ => CoreError::SinkClosed,
            })
    }

    async fn retire(&self, vehicle_id: &str) -> fleetcast_core::Result<()> {
        self.remove_vehicle(vehicle_id)
            .await
            .map(|_| ())
            .map_err(|_| CoreError::SinkClosed)
    }
}

/// Spawn the dispatch task.
pub fn spawn_hub(config: HubConfig) -> (HubHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(config.command_capacity.max(1));
    let registry = Arc::new(RwLock::new(PositionRegistry::new(config.trail_len)));
    let max_connections = config.max_connections.min(Semaphore::MAX_PERMITS);

    let handle = HubHandle {
        tx,
        registry: Arc::clone(&registry),
        permits: Arc::new(Semaphore::new(max_connections)),
        max_connections,
        next_id: Arc::new(AtomicU64::new(1)),
        queue_depth: config.queue_depth,
    };

    let hub = BroadcastHub {
        rx,
        connections: HashMap::new(),
        registry,
        config,
    };
    let join = tokio::spawn(hub.run());

    (handle, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcast_core::{GeoPoint, PositionPayload, VehicleType};
    use std::time::Duration;

    fn metro(id: &str, ts: i64) -> VehiclePosition {
        VehiclePosition::new(
            id,
            VehicleType::Metro,
            GeoPoint::new(36.80, 10.18),
            40.0,
            0.0,
            ts,
        )
    }

    async fn next_message(conn: &ConnectionHandle) -> WireMessage {
        let raw = tokio::time::timeout(Duration::from_secs(1), conn.recv())
            .await
            .expect("timed out waiting for message")
            .expect("queue closed");
        WireMessage::parse(&raw).unwrap()
    }

    async fn subscribed(hub: &HubHandle) -> ConnectionHandle {
        let conn = hub.connect().await.unwrap();
        hub.subscribe(conn.id()).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_update_reaches_subscriber() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let viewer = subscribed(&hub).await;

        hub.report_update(None, metro("m1", 1_000)).await.unwrap();

        let WireMessage::UpdateLocation { payload } = next_message(&viewer).await else {
            panic!("expected update_location");
        };
        assert_eq!(payload, PositionPayload::from(&metro("m1", 1_000)));
        assert_eq!(hub.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_echo_to_reporter_by_default() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let a = subscribed(&hub).await;
        let b = subscribed(&hub).await;

        hub.report_update(Some(a.id()), metro("m1", 1)).await.unwrap();
        hub.stats().await.unwrap();

        assert!(matches!(next_message(&a).await, WireMessage::UpdateLocation { .. }));
        assert!(matches!(next_message(&b).await, WireMessage::UpdateLocation { .. }));
    }

    #[tokio::test]
    async fn test_suppress_self_echo() {
        let config = HubConfig {
            suppress_self_echo: true,
            ..HubConfig::default()
        };
        let (hub, _join) = spawn_hub(config);
        let a = subscribed(&hub).await;
        let b = subscribed(&hub).await;

        hub.report_update(Some(a.id()), metro("m1", 1)).await.unwrap();
        hub.stats().await.unwrap();

        assert!(matches!(next_message(&b).await, WireMessage::UpdateLocation { .. }));
        assert!(a.outbound().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribed_connection_receives_nothing() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let publisher = hub.connect().await.unwrap();

        hub.report_update(Some(publisher.id()), metro("m1", 1))
            .await
            .unwrap();
        hub.stats().await.unwrap();

        assert!(publisher.outbound().is_empty());
    }

    #[tokio::test]
    async fn test_updates_delivered_in_order() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let viewer = subscribed(&hub).await;

        for ts in 1..=10 {
            hub.report_update(None, metro("m1", ts)).await.unwrap();
        }
        for expected in 1..=10 {
            let WireMessage::UpdateLocation { payload } = next_message(&viewer).await else {
                panic!("expected update_location");
            };
            assert_eq!(payload.timestamp, Some(expected));
        }
    }

    #[tokio::test]
    async fn test_replay_once_on_first_subscribe() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        hub.report_update(None, metro("a", 1)).await.unwrap();
        hub.report_update(None, metro("b", 1)).await.unwrap();

        let late = hub.connect().await.unwrap();
        hub.subscribe(late.id()).await.unwrap();
        hub.subscribe(late.id()).await.unwrap();
        let stats = hub.stats().await.unwrap();

        assert_eq!(stats.subscribers, 1);
        assert_eq!(late.outbound().len(), 2);
    }

    #[tokio::test]
    async fn test_replay_disabled() {
        let config = HubConfig {
            replay_on_subscribe: false,
            ..HubConfig::default()
        };
        let (hub, _join) = spawn_hub(config);
        hub.report_update(None, metro("a", 1)).await.unwrap();

        let late = subscribed(&hub).await;
        hub.stats().await.unwrap();
        assert!(late.outbound().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_update_rejected() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let viewer = subscribed(&hub).await;

        let mut bad = metro("m1", 1);
        bad.latitude = 123.0;
        assert!(matches!(
            hub.report_update(None, bad).await,
            Err(HubError::Validation(CoreError::LatitudeOutOfRange(_)))
        ));
        hub.stats().await.unwrap();
        assert!(viewer.outbound().is_empty());
        assert_eq!(hub.vehicle_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_emits_removed_per_vehicle() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let viewer = subscribed(&hub).await;
        hub.report_update(None, metro("old", 1_000)).await.unwrap();
        hub.report_update(None, metro("new", 60_000)).await.unwrap();
        next_message(&viewer).await;
        next_message(&viewer).await;

        let removed = hub.sweep_stale_at(61_000).await.unwrap();
        assert_eq!(removed, vec!["old".to_string()]);
        assert_eq!(next_message(&viewer).await, WireMessage::removed("old"));
        assert!(viewer.outbound().is_empty());
        assert_eq!(hub.vehicle_count(), 1);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let config = HubConfig {
            max_connections: 1,
            ..HubConfig::default()
        };
        let (hub, _join) = spawn_hub(config);
        let first = hub.connect().await.unwrap();
        assert!(matches!(
            hub.connect().await,
            Err(HubError::ResourceExhausted(1))
        ));
        hub.disconnect(first.id()).await.unwrap();
        drop(first);
        assert!(hub.connect().await.is_ok());
    }

    #[tokio::test]
    async fn test_connection_count_follows_handles() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let a = hub.connect().await.unwrap();
        let _b = hub.connect().await.unwrap();
        assert_eq!(hub.connection_count(), 2);

        hub.disconnect(a.id()).await.unwrap();
        drop(a);
        assert_eq!(hub.connection_count(), 1);
        assert!(!hub.at_capacity());
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_oldest_without_delaying_others() {
        let config = HubConfig {
            queue_depth: 2,
            ..HubConfig::default()
        };
        let (hub, _join) = spawn_hub(config);
        let slow = subscribed(&hub).await;
        let fast = subscribed(&hub).await;

        for ts in 1..=10 {
            hub.report_update(None, metro("m1", ts)).await.unwrap();
            let WireMessage::UpdateLocation { payload } = next_message(&fast).await else {
                panic!("expected update_location");
            };
            assert_eq!(payload.timestamp, Some(ts));
        }

        assert_eq!(slow.outbound().len(), 2);
        assert_eq!(slow.outbound().dropped(), 8);
        assert_eq!(fast.outbound().dropped(), 0);
        // The slow queue keeps the two newest updates
        for expected in [9, 10] {
            let WireMessage::UpdateLocation { payload } = next_message(&slow).await else {
                panic!("expected update_location");
            };
            assert_eq!(payload.timestamp, Some(expected));
        }
    }

    #[tokio::test]
    async fn test_disconnected_subscriber_does_not_affect_others() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let gone = subscribed(&hub).await;
        let viewer = subscribed(&hub).await;

        hub.disconnect(gone.id()).await.unwrap();
        drop(gone);
        hub.report_update(None, metro("m1", 1)).await.unwrap();

        assert!(matches!(next_message(&viewer).await, WireMessage::UpdateLocation { .. }));
        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.subscribers, 1);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_vehicle() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let driver = hub.connect().await.unwrap();
        hub.report_update(Some(driver.id()), metro("m1", 1))
            .await
            .unwrap();
        hub.disconnect(driver.id()).await.unwrap();

        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.connections, 0);
        assert_eq!(stats.vehicles, 1);
        assert!(driver.outbound().is_closed());
    }

    #[tokio::test]
    async fn test_position_sink_retire() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let viewer = subscribed(&hub).await;
        let sink: Arc<dyn PositionSink> = Arc::new(hub.clone());

        sink.publish(metro("sim", 1)).await.unwrap();
        sink.retire("sim").await.unwrap();

        assert!(matches!(next_message(&viewer).await, WireMessage::UpdateLocation { .. }));
        assert_eq!(next_message(&viewer).await, WireMessage::removed("sim"));
        assert_eq!(hub.vehicle_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_queues() {
        let (hub, join) = spawn_hub(HubConfig::default());
        let viewer = subscribed(&hub).await;
        hub.shutdown().await.unwrap();
        join.await.unwrap();

        assert!(viewer.recv().await.is_none());
        assert!(matches!(hub.stats().await, Err(HubError::Closed)));
    }
}
