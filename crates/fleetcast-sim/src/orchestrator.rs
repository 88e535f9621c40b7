//! Simulation lifecycle: one task per simulated vehicle.
//!
//! Each task fetches its route, then publishes a position every update
//! interval through the `PositionSink` until its cancellation token fires.
//! Rail vehicles follow an open line out and back; road vehicles loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fleetcast_core::{now_ms, GeoPoint, PositionSink, VehicleType};
use fleetcast_route::{RouteOutcome, RouteProvider, RouteResult};
use fleetcast_telemetry::Metrics;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::session::SimulationSession;
use crate::status::SimulationStatus;

/// A path is treated as a loop when its ends are this close.
const CLOSED_TOLERANCE_M: f64 = 1.0;

/// Parameters of a simulation to start.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub speed_kmh: f32,
    pub center: GeoPoint,
    pub driver_name: Option<String>,
}

impl SimulationRequest {
    pub fn validate(&self) -> SimResult<()> {
        if self.vehicle_id.trim().is_empty() {
            return Err(SimError::InvalidRequest(
                "vehicle id must not be empty".to_string(),
            ));
        }
        if !self.speed_kmh.is_finite() || self.speed_kmh < 0.0 {
            return Err(SimError::InvalidRequest(format!(
                "speed must be finite and non-negative, got {}",
                self.speed_kmh
            )));
        }
        self.center.validate()?;
        Ok(())
    }
}

/// Summary of a simulation for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInfo {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub speed_kmh: f32,
    pub status: SimulationStatus,
}

struct SessionHandle {
    vehicle_type: VehicleType,
    speed_kmh: f32,
    cancel: CancellationToken,
    /// Taken by `stop`, which keeps the entry until the vehicle is retired.
    task: Option<JoinHandle<()>>,
    status: Arc<RwLock<SimulationStatus>>,
}

impl SessionHandle {
    fn is_stopping(&self) -> bool {
        self.task.is_none()
    }

    fn is_finished(&self) -> bool {
        self.task.as_ref().is_some_and(JoinHandle::is_finished)
    }
}

/// Counts a simulation task as active for as long as it lives.
struct ActiveSimulation {
    active: Arc<AtomicUsize>,
}

impl ActiveSimulation {
    fn new(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Metrics::simulation_started();
        Self {
            active: Arc::clone(active),
        }
    }
}

impl Drop for ActiveSimulation {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        Metrics::simulation_stopped();
    }
}

/// Starts, tracks and stops simulated vehicles.
pub struct SimulationOrchestrator {
    routes: Arc<RouteProvider>,
    sink: Arc<dyn PositionSink>,
    config: SimulationConfig,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    active: Arc<AtomicUsize>,
}

impl SimulationOrchestrator {
    pub fn new(
        routes: Arc<RouteProvider>,
        sink: Arc<dyn PositionSink>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            routes,
            sink,
            config,
            sessions: Mutex::new(HashMap::new()),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start simulating a vehicle.
    ///
    /// A finished session with the same id (stopped by an error) is
    /// replaced; one that is running or still being stopped is not.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: SimulationRequest) -> SimResult<()> {
        request.validate()?;

        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(&request.vehicle_id) {
            if existing.is_stopping() || !existing.is_finished() {
                return Err(SimError::AlreadyRunning(request.vehicle_id));
            }
            sessions.remove(&request.vehicle_id);
        }
        if sessions.len() >= self.config.max_sessions {
            return Err(SimError::ResourceExhausted(self.config.max_sessions));
        }

        let cancel = CancellationToken::new();
        let status = Arc::new(RwLock::new(SimulationStatus::Connecting));
        let vehicle_id = request.vehicle_id.clone();
        let vehicle_type = request.vehicle_type;
        let speed_kmh = request.speed_kmh;

        let task = SimulationTask {
            request,
            routes: Arc::clone(&self.routes),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
            cancel: cancel.clone(),
            status: Arc::clone(&status),
            _active: ActiveSimulation::new(&self.active),
        };
        let task = tokio::spawn(task.run());

        info!(
            vehicle_id = %vehicle_id,
            vehicle_type = %vehicle_type,
            speed_kmh,
            "Simulation started"
        );
        sessions.insert(
            vehicle_id,
            SessionHandle {
                vehicle_type,
                speed_kmh,
                cancel,
                task: Some(task),
                status,
            },
        );
        Ok(())
    }

    /// Stop a simulation, wait for its task to exit and retire the vehicle.
    ///
    /// The entry stays in place until the vehicle is retired, so a `start`
    /// with the same id cannot race the removal.
    pub async fn stop(&self, vehicle_id: &str) -> SimResult<()> {
        let (cancel, task) = {
            let mut sessions = self.sessions.lock();
            let handle = sessions
                .get_mut(vehicle_id)
                .filter(|h| !h.is_stopping())
                .ok_or_else(|| SimError::NotFound(vehicle_id.to_string()))?;
            (handle.cancel.clone(), handle.task.take())
        };

        cancel.cancel();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(vehicle_id, error = %e, "Simulation task failed");
            }
        }

        let retired = self.sink.retire(vehicle_id).await;
        self.sessions.lock().remove(vehicle_id);
        retired?;
        info!(vehicle_id, "Simulation stopped");
        Ok(())
    }

    /// Stop every simulation.
    pub async fn stop_all(&self) {
        let ids: Vec<String> = self
            .sessions
            .lock()
            .iter()
            .filter(|(_, h)| !h.is_stopping())
            .map(|(id, _)| id.clone())
            .collect();
        for id in ids {
            if let Err(e) = self.stop(&id).await {
                warn!(vehicle_id = %id, error = %e, "Failed to stop simulation");
            }
        }
    }

    pub fn status(&self, vehicle_id: &str) -> Option<SimulationStatus> {
        self.sessions
            .lock()
            .get(vehicle_id)
            .map(|h| h.status.read().clone())
    }

    /// All simulations sorted by vehicle id.
    pub fn list(&self) -> Vec<SimulationInfo> {
        let mut infos: Vec<SimulationInfo> = self
            .sessions
            .lock()
            .iter()
            .map(|(id, h)| SimulationInfo {
                vehicle_id: id.clone(),
                vehicle_type: h.vehicle_type,
                speed_kmh: h.speed_kmh,
                status: h.status.read().clone(),
            })
            .collect();
        infos.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        infos
    }

    /// Simulation tasks still running. A task that ended in an error is
    /// not counted even while its entry remains listed.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

// ============================================================================
// SimulationTask
// ============================================================================

struct SimulationTask {
    request: SimulationRequest,
    routes: Arc<RouteProvider>,
    sink: Arc<dyn PositionSink>,
    config: SimulationConfig,
    cancel: CancellationToken,
    status: Arc<RwLock<SimulationStatus>>,
    _active: ActiveSimulation,
}

impl SimulationTask {
    async fn run(self) {
        let vehicle_id = self.request.vehicle_id.clone();

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.set_status(SimulationStatus::Stopped);
                debug!(vehicle_id = %vehicle_id, "Simulation cancelled during route fetch");
                return;
            }
            outcome = self.fetch_route() => outcome,
        };

        let mut session = match outcome
            .map_err(SimError::from)
            .and_then(|outcome| self.build_session(outcome))
        {
            Ok(session) => session,
            Err(e) => {
                error!(vehicle_id = %vehicle_id, error = %e, "Simulation could not start");
                self.set_status(SimulationStatus::Error(e.to_string()));
                return;
            }
        };

        let mut ticker = tokio::time::interval(self.config.update_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately: publish the start position.
        ticker.tick().await;
        let mut position = session.position(now_ms());

        loop {
            if let Err(e) = self.sink.publish(position).await {
                error!(vehicle_id = %vehicle_id, error = %e, "Failed to publish simulated position");
                self.set_status(SimulationStatus::Error(e.to_string()));
                return;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            position = session.tick(now_ms());
        }

        self.set_status(SimulationStatus::Stopped);
        debug!(vehicle_id = %vehicle_id, "Simulation loop exited");
    }

    async fn fetch_route(&self) -> RouteResult<RouteOutcome> {
        let center = self.request.center;
        if self.request.vehicle_type.is_rail() {
            self.routes
                .fetch_rail_route(center, self.config.rail_length_m)
                .await
        } else {
            self.routes
                .fetch_road_route(center, self.config.road_radius_m)
                .await
        }
    }

    fn build_session(&self, outcome: RouteOutcome) -> SimResult<SimulationSession> {
        let fallback = outcome.is_fallback();
        let mut path = outcome.path;
        if self.request.vehicle_type.is_rail() && !path.is_closed(CLOSED_TOLERANCE_M) {
            path = path.out_and_back();
        }

        let session = SimulationSession::new(
            self.request.vehicle_id.clone(),
            self.request.vehicle_type,
            path,
            self.request.speed_kmh,
            self.config.update_interval_ms,
        )?
        .with_driver(self.request.driver_name.clone());

        info!(
            vehicle_id = %self.request.vehicle_id,
            points = session.path().len(),
            lap_m = session.path().loop_length_m().round(),
            fallback,
            "Simulation route ready"
        );
        self.set_status(if fallback {
            SimulationStatus::UsingFallback
        } else {
            SimulationStatus::Running
        });
        Ok(session)
    }

    fn set_status(&self, status: SimulationStatus) {
        *self.status.write() = status;
    }
}
