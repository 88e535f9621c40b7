//! WebSocket wire messages.
//!
//! Every frame is a JSON object tagged by `event`:
//!
//! ```text
//! { "event": "subscribe" }
//! { "event": "update_location", "payload": { "vehicleId": "m1", "type": "METRO", ... } }
//! { "event": "vehicle_removed", "vehicleId": "m1" }
//! ```
//!
//! The server re-broadcasts `update_location` in the same shape it accepts.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{VehiclePosition, VehicleType};

/// A message exchanged with a hub connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WireMessage {
    /// Client asks to receive broadcasts.
    Subscribe,
    /// A vehicle position report (inbound) or broadcast (outbound).
    UpdateLocation { payload: PositionPayload },
    /// A vehicle was retired from the registry.
    VehicleRemoved {
        #[serde(rename = "vehicleId")]
        vehicle_id: String,
    },
}

impl WireMessage {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CoreError::InvalidMessage(e.to_string()))
    }

    /// Serialize to a text frame.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::InvalidMessage(e.to_string()))
    }

    /// Broadcast envelope for a position.
    pub fn update(position: &VehiclePosition) -> Self {
        Self::UpdateLocation {
            payload: PositionPayload::from(position),
        }
    }

    pub fn removed(vehicle_id: impl Into<String>) -> Self {
        Self::VehicleRemoved {
            vehicle_id: vehicle_id.into(),
        }
    }
}

/// JSON payload of an `update_location` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPayload {
    pub vehicle_id: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub lat: f64,
    pub lng: f64,
    /// Speed in km/h.
    #[serde(default)]
    pub speed: f32,
    /// Heading in degrees.
    #[serde(default)]
    pub bearing: f32,
    /// Report time (Unix ms). Filled with the receive time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_photo_ref: Option<String>,
}

impl PositionPayload {
    /// Convert to a domain position, stamping `received_at_ms` if the
    /// client sent no timestamp.
    pub fn into_position(self, received_at_ms: i64) -> VehiclePosition {
        VehiclePosition {
            vehicle_id: self.vehicle_id,
            vehicle_type: self.vehicle_type,
            latitude: self.lat,
            longitude: self.lng,
            speed_kmh: self.speed,
            bearing_deg: self.bearing,
            timestamp_ms: self.timestamp.unwrap_or(received_at_ms),
            driver_name: self.driver_name,
            driver_photo_ref: self.driver_photo_ref,
        }
    }
}

impl From<&VehiclePosition> for PositionPayload {
    fn from(pos: &VehiclePosition) -> Self {
        Self {
            vehicle_id: pos.vehicle_id.clone(),
            vehicle_type: pos.vehicle_type,
            lat: pos.latitude,
            lng: pos.longitude,
            speed: pos.speed_kmh,
            bearing: pos.bearing_deg,
            timestamp: Some(pos.timestamp_ms),
            driver_name: pos.driver_name.clone(),
            driver_photo_ref: pos.driver_photo_ref.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    #[test]
    fn test_parse_subscribe() {
        let msg = WireMessage::parse(r#"{"event":"subscribe"}"#).unwrap();
        assert_eq!(msg, WireMessage::Subscribe);
    }

    #[test]
    fn test_parse_update_location() {
        let text = r#"{"event":"update_location","payload":{
            "vehicleId":"m1","type":"metro","lat":36.80,"lng":10.18,
            "speed":40,"bearing":0,"timestamp":1700000000000}}"#;
        let msg = WireMessage::parse(text).unwrap();
        let WireMessage::UpdateLocation { payload } = msg else {
            panic!("expected update_location");
        };
        assert_eq!(payload.vehicle_id, "m1");
        assert_eq!(payload.vehicle_type, VehicleType::Metro);
        assert_eq!(payload.speed, 40.0);
        assert_eq!(payload.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_missing_timestamp_uses_receive_time() {
        let text = r#"{"event":"update_location","payload":{
            "vehicleId":"b7","type":"BUS","lat":1.0,"lng":2.0}}"#;
        let WireMessage::UpdateLocation { payload } = WireMessage::parse(text).unwrap() else {
            panic!("expected update_location");
        };
        let pos = payload.into_position(42);
        assert_eq!(pos.timestamp_ms, 42);
        assert_eq!(pos.speed_kmh, 0.0);
    }

    #[test]
    fn test_unknown_event_and_type_rejected() {
        assert!(WireMessage::parse(r#"{"event":"teleport"}"#).is_err());
        let text = r#"{"event":"update_location","payload":{
            "vehicleId":"x","type":"ZEPPELIN","lat":1.0,"lng":2.0}}"#;
        assert!(matches!(
            WireMessage::parse(text),
            Err(CoreError::InvalidMessage(_))
        ));
        assert!(WireMessage::parse("not json").is_err());
    }

    #[test]
    fn test_update_serializes_wire_shape() {
        let pos = VehiclePosition::new(
            "m1",
            VehicleType::Metro,
            GeoPoint::new(36.8, 10.18),
            40.0,
            90.0,
            5,
        );
        let json: serde_json::Value =
            serde_json::from_str(&WireMessage::update(&pos).to_json().unwrap()).unwrap();
        assert_eq!(json["event"], "update_location");
        assert_eq!(json["payload"]["vehicleId"], "m1");
        assert_eq!(json["payload"]["type"], "METRO");
        assert_eq!(json["payload"]["timestamp"], 5);
        assert!(json["payload"].get("driverName").is_none());
    }

    #[test]
    fn test_removed_serializes_wire_shape() {
        let json = WireMessage::removed("m1").to_json().unwrap();
        assert_eq!(json, r#"{"event":"vehicle_removed","vehicleId":"m1"}"#);
    }
}
