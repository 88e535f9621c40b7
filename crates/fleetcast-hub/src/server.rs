//! WebSocket transport and read-only HTTP endpoints for the hub.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use fleetcast_core::{now_ms, PositionPayload, WireMessage};
use fleetcast_telemetry::Metrics;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{HubError, HubResult};
use crate::hub::{ConnectionId, HubHandle};
use crate::registry::TrailPoint;

/// Routes served by the hub: `/ws`, `/health`, `/api/vehicles`,
/// `/api/vehicles/{id}/trail`.
pub fn hub_router(hub: HubHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/vehicles", get(list_vehicles))
        .route("/api/vehicles/{id}/trail", get(vehicle_trail))
        .with_state(hub)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    connections: usize,
    vehicles: usize,
}

async fn health(State(hub): State<HubHandle>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: hub.connection_count(),
        vehicles: hub.vehicle_count(),
    })
}

async fn list_vehicles(State(hub): State<HubHandle>) -> Json<Vec<PositionPayload>> {
    Json(hub.snapshot().iter().map(PositionPayload::from).collect())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrailResponse {
    vehicle_id: String,
    points: Vec<TrailPoint>,
}

async fn vehicle_trail(State(hub): State<HubHandle>, Path(id): Path<String>) -> Response {
    match hub.trail(&id) {
        Some(points) => Json(TrailResponse {
            vehicle_id: id,
            points,
        })
        .into_response(),
        None => (StatusCode::NOT_FOUND, "Unknown vehicle").into_response(),
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(State(hub): State<HubHandle>, ws: WebSocketUpgrade) -> Response {
    if hub.at_capacity() {
        warn!(
            current = hub.connection_count(),
            "WebSocket connection limit reached"
        );
        Metrics::connection_rejected();
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Run one connection: a writer task drains the outbound queue while this
/// task reads frames and forwards them to the hub.
async fn handle_socket(socket: WebSocket, hub: HubHandle) {
    // The permit is taken again here: another client may have filled it
    // between the upgrade check and now.
    let conn = match hub.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "Connection refused after upgrade");
            return;
        }
    };
    let id = conn.id();
    info!(connection = %id, connections = hub.connection_count(), "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();

    let outbound = conn.outbound();
    let mut writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sender
                .send(Message::Text(message.to_string().into()))
                .await
                .is_err()
            {
                debug!("Failed to send message, client disconnected");
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut writer_done = false;
    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if handle_text(&hub, id, text.as_str()).await.is_err() {
                        debug!(connection = %id, "Hub stopped, closing connection");
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!(connection = %id, "Client closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(connection = %id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            _ = &mut writer => {
                writer_done = true;
                debug!(connection = %id, "Writer finished, closing connection");
                break;
            }
        }
    }

    let _ = hub.disconnect(id).await;
    if !writer_done {
        // Disconnect closes the queue, which ends the writer.
        let _ = writer.await;
    }
    drop(conn);

    info!(
        connection = %id,
        connections = hub.connection_count(),
        "WebSocket connection closed"
    );
}

/// Forward one text frame. Only a stopped hub is an error; bad input is
/// logged and dropped.
async fn handle_text(hub: &HubHandle, id: ConnectionId, text: &str) -> HubResult<()> {
    let message = match WireMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            Metrics::update_rejected(e.reason());
            warn!(connection = %id, error = %e, "Dropping malformed message");
            return Ok(());
        }
    };

    match message {
        WireMessage::Subscribe => hub.subscribe(id).await,
        WireMessage::UpdateLocation { payload } => {
            let position = payload.into_position(now_ms());
            match hub.report_update(Some(id), position).await {
                Err(HubError::Validation(e)) => {
                    warn!(connection = %id, error = %e, "Dropping invalid position update");
                    Ok(())
                }
                other => other,
            }
        }
        WireMessage::VehicleRemoved { vehicle_id } => {
            Metrics::update_rejected("unexpected_event");
            warn!(connection = %id, vehicle_id = %vehicle_id, "Ignoring client-sent vehicle_removed");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::hub::spawn_hub;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use fleetcast_core::{GeoPoint, VehiclePosition, VehicleType};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn hub_with_vehicle() -> HubHandle {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let position = VehiclePosition::new(
            "m1",
            VehicleType::Metro,
            GeoPoint::new(36.80, 10.18),
            40.0,
            0.0,
            1_700_000_000_000,
        );
        hub.report_update(None, position).await.unwrap();
        hub.stats().await.unwrap();
        hub
    }

    #[tokio::test]
    async fn test_health() {
        let hub = hub_with_vehicle().await;
        let (status, body) = get_json(hub_router(hub), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["vehicles"], 1);
    }

    #[tokio::test]
    async fn test_list_vehicles() {
        let hub = hub_with_vehicle().await;
        let (status, body) = get_json(hub_router(hub), "/api/vehicles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["vehicleId"], "m1");
        assert_eq!(body[0]["type"], "METRO");
    }

    #[tokio::test]
    async fn test_trail() {
        let hub = hub_with_vehicle().await;
        let (status, body) = get_json(hub_router(hub.clone()), "/api/vehicles/m1/trail").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vehicleId"], "m1");
        assert_eq!(body["points"].as_array().unwrap().len(), 1);

        let (status, _) = get_json(hub_router(hub), "/api/vehicles/nope/trail").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handle_text_drops_bad_input() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let conn = hub.connect().await.unwrap();

        assert!(handle_text(&hub, conn.id(), "{not json").await.is_ok());
        let out_of_range = r#"{"event":"update_location","payload":{
            "vehicleId":"x","type":"CAR","lat":100.0,"lng":0.0}}"#;
        assert!(handle_text(&hub, conn.id(), out_of_range).await.is_ok());
        assert!(handle_text(&hub, conn.id(), r#"{"event":"vehicle_removed","vehicleId":"x"}"#)
            .await
            .is_ok());

        hub.stats().await.unwrap();
        assert_eq!(hub.vehicle_count(), 0);
    }
}
