//! Simulation control and metrics endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use fleetcast_core::{GeoPoint, VehicleType};
use fleetcast_route::RouteError;
use fleetcast_sim::{SimError, SimulationInfo, SimulationOrchestrator, SimulationRequest};
use fleetcast_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// `/api/simulations` routes.
pub fn simulation_router(orchestrator: Arc<SimulationOrchestrator>) -> Router {
    Router::new()
        .route(
            "/api/simulations",
            get(list_simulations).post(start_simulation),
        )
        .route(
            "/api/simulations/{id}",
            get(get_simulation).delete(stop_simulation),
        )
        .with_state(orchestrator)
}

/// `/metrics` in Prometheus text format.
pub fn metrics_router() -> Router {
    Router::new().route("/metrics", get(metrics))
}

async fn metrics() -> Response {
    match Metrics::render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSimulationBody {
    pub vehicle_id: String,
    pub vehicle_type: String,
    pub speed_kmh: f32,
    pub center_lat: f64,
    pub center_lng: f64,
    #[serde(default)]
    pub driver_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationView {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub speed_kmh: f32,
    pub status: String,
}

impl From<SimulationInfo> for SimulationView {
    fn from(info: SimulationInfo) -> Self {
        Self {
            vehicle_id: info.vehicle_id,
            vehicle_type: info.vehicle_type,
            speed_kmh: info.speed_kmh,
            status: info.status.to_string(),
        }
    }
}

/// Simulation error mapped to an HTTP status.
struct ApiError(SimError);

impl From<SimError> for ApiError {
    fn from(e: SimError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SimError::AlreadyRunning(_) => StatusCode::CONFLICT,
            SimError::NotFound(_) => StatusCode::NOT_FOUND,
            SimError::ResourceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            SimError::InvalidRequest(_)
            | SimError::Core(_)
            | SimError::Route(RouteError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            SimError::Route(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "Simulation request failed");
        }
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn start_simulation(
    State(orchestrator): State<Arc<SimulationOrchestrator>>,
    Json(body): Json<StartSimulationBody>,
) -> Result<(StatusCode, Json<SimulationView>), ApiError> {
    let vehicle_type: VehicleType = body.vehicle_type.parse().map_err(SimError::from)?;
    let request = SimulationRequest {
        vehicle_id: body.vehicle_id,
        vehicle_type,
        speed_kmh: body.speed_kmh,
        center: GeoPoint::new(body.center_lat, body.center_lng),
        driver_name: body.driver_name,
    };
    let vehicle_id = request.vehicle_id.clone();

    orchestrator.start(request)?;

    let info = orchestrator
        .list()
        .into_iter()
        .find(|info| info.vehicle_id == vehicle_id)
        .ok_or(SimError::NotFound(vehicle_id))?;
    Ok((StatusCode::CREATED, Json(info.into())))
}

async fn list_simulations(
    State(orchestrator): State<Arc<SimulationOrchestrator>>,
) -> Json<Vec<SimulationView>> {
    Json(orchestrator.list().into_iter().map(Into::into).collect())
}

async fn get_simulation(
    State(orchestrator): State<Arc<SimulationOrchestrator>>,
    Path(id): Path<String>,
) -> Result<Json<SimulationView>, ApiError> {
    orchestrator
        .list()
        .into_iter()
        .find(|info| info.vehicle_id == id)
        .map(|info| Json(info.into()))
        .ok_or_else(|| SimError::NotFound(id).into())
}

async fn stop_simulation(
    State(orchestrator): State<Arc<SimulationOrchestrator>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    orchestrator.stop(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
