//! JSON messages exchanged with the device and the dashboard.
//!
//! Every message is an object tagged by its `type` field.

use crate::core::{Classification, SensorReading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FALL_ALERT_MESSAGE: &str = "Fall detected! Emergency services contacted.";
pub const POSTURE_ALERT_MESSAGE: &str = "Poor posture detected. Vibration alert sent.";
pub const CONNECTED_MESSAGE: &str = "Device connected successfully";
pub const INVALID_USER_MESSAGE: &str = "Invalid user";

/// Messages received from the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    DeviceConnect {
        #[serde(default)]
        device_id: Option<String>,
        #[serde(default)]
        user_id: Option<i64>,
    },
    PostureData {
        #[serde(default)]
        sensor_data: SensorReading,
    },
    Heartbeat,
    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Reading plus verdicts, as pushed to the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostureUpdate {
    pub timestamp: DateTime<Utc>,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub posture_correct: Option<bool>,
    pub posture_confidence: Option<f64>,
    pub fall_detected: bool,
    pub fall_confidence: Option<f64>,
}

impl PostureUpdate {
    pub fn new(reading: &SensorReading, classification: &Classification, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            tilt_x: reading.tilt_x,
            tilt_y: reading.tilt_y,
            gyro_x: reading.gyro_x,
            gyro_y: reading.gyro_y,
            gyro_z: reading.gyro_z,
            posture_correct: classification.posture_correct(),
            posture_confidence: classification.posture_confidence(),
            fall_detected: classification.is_fall(),
            fall_confidence: classification.fall_confidence(),
        }
    }
}

/// Messages sent to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    ConnectionSuccess {
        message: String,
        user: String,
    },
    ConnectionError {
        message: String,
    },
    HeartbeatAck,
    PostureUpdate {
        data: PostureUpdate,
    },
    FallAlert {
        message: String,
        timestamp: DateTime<Utc>,
    },
    VibrationCommand {
        duration: u32,
        pattern: String,
    },
    PostureAlert {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

impl OutboundMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Value of the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionSuccess { .. } => "connection_success",
            Self::ConnectionError { .. } => "connection_error",
            Self::HeartbeatAck => "heartbeat_ack",
            Self::PostureUpdate { .. } => "posture_update",
            Self::FallAlert { .. } => "fall_alert",
            Self::VibrationCommand { .. } => "vibration_command",
            Self::PostureAlert { .. } => "posture_alert",
            Self::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PostureVerdict;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decodes_posture_data() {
        let msg = InboundMessage::decode(
            r#"{"type":"posture_data","sensor_data":{"tilt_x":1.5,"tilt_y":-2,"gyro_x":0.1,"gyro_y":0.2,"gyro_z":0.3}}"#,
        )
        .unwrap();

        match msg {
            InboundMessage::PostureData { sensor_data } => {
                assert_eq!(sensor_data.tilt(), [1.5, -2.0]);
                assert_eq!(sensor_data.gyro(), [0.1, 0.2, 0.3]);
            }
            other => panic!("Expected PostureData, got {other:?}"),
        }
    }

    #[test]
    fn posture_data_without_sensor_block_is_all_zero() {
        let msg = InboundMessage::decode(r#"{"type":"posture_data"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::PostureData {
                sensor_data: SensorReading::default()
            }
        );
    }

    #[test]
    fn decodes_device_connect() {
        let msg = InboundMessage::decode(r#"{"type":"device_connect","device_id":"esp32-7","user_id":3}"#)
            .unwrap();
        assert_eq!(
            msg,
            InboundMessage::DeviceConnect {
                device_id: Some("esp32-7".to_string()),
                user_id: Some(3),
            }
        );
    }

    #[test]
    fn unknown_type_decodes_as_unknown() {
        let msg = InboundMessage::decode(r#"{"type":"firmware_report","version":2}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
    }

    #[test]
    fn malformed_messages_fail_to_decode() {
        assert!(InboundMessage::decode("{not json").is_err());
        assert!(InboundMessage::decode(r#"{"sensor_data":{}}"#).is_err());
        assert!(
            InboundMessage::decode(r#"{"type":"posture_data","sensor_data":{"tilt_x":"high"}}"#)
                .is_err()
        );
    }

    #[test]
    fn heartbeat_ack_has_only_type() {
        let json = serde_json::to_value(OutboundMessage::HeartbeatAck).unwrap();
        assert_eq!(json, json!({"type": "heartbeat_ack"}));
    }

    #[test]
    fn vibration_command_shape() {
        let json = serde_json::to_value(OutboundMessage::VibrationCommand {
            duration: 2000,
            pattern: "pulse".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            json!({"type": "vibration_command", "duration": 2000, "pattern": "pulse"})
        );
    }

    #[test]
    fn posture_update_renders_missing_verdicts_as_null() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let reading = SensorReading {
            tilt_x: 1.0,
            ..SensorReading::default()
        };
        let classification = Classification::new(
            Some(PostureVerdict {
                correct: true,
                confidence: 0.75,
            }),
            None,
        );

        let json = serde_json::to_value(OutboundMessage::PostureUpdate {
            data: PostureUpdate::new(&reading, &classification, at),
        })
        .unwrap();

        assert_eq!(json["type"], "posture_update");
        assert_eq!(json["data"]["timestamp"], "2024-03-01T08:00:00Z");
        assert_eq!(json["data"]["posture_correct"], true);
        assert_eq!(json["data"]["posture_confidence"], 0.75);
        assert_eq!(json["data"]["fall_detected"], false);
        assert!(json["data"]["fall_confidence"].is_null());
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let messages = [
            OutboundMessage::error("boom"),
            OutboundMessage::ConnectionError {
                message: INVALID_USER_MESSAGE.to_string(),
            },
            OutboundMessage::HeartbeatAck,
        ];
        for message in messages {
            let json = serde_json::to_value(&message).unwrap();
            assert_eq!(json["type"], message.kind());
        }
    }
}
