#![forbid(unsafe_code)]

//! Inbound host messages.
//!
//! The host posts flat JSON objects discriminated by `type`, e.g.
//! `{"type":"update","frontSpeed":54}`. [`parse_inbound`] decodes them into
//! [`InboundMessage`]; unknown types and undecodable payloads become
//! [`MessageError`] values the bridge logs and drops.

use std::collections::BTreeMap;

use radar_core::panel::PanelPosition;
use radar_core::readings::{Direction, PartialUpdate, lenient_count};
use radar_core::store::{Keybinds, NotificationType, SpeedUnit};
use serde::Deserialize;
use serde_json::Value;

/// Every `type` the overlay understands.
pub const MESSAGE_TYPES: &[&str] = &[
    "open",
    "close",
    "update",
    "plateUpdate",
    "toggleLock",
    "toggleSpeedLock",
    "togglePlateLock",
    "toggleLog",
    "toggleBolo",
    "toggleKeybinds",
    "saveReading",
    "setKeybinds",
    "setNotificationType",
    "setSpeedUnit",
    "setLedGlow",
    "selectDirection",
    "updateBoloPlates",
    "loadPositions",
    "openSpeedLockModal",
    "speedLockTriggered",
    "setSpeedLockThreshold",
];

/// Decoded host message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    Open,
    Close,
    Update(PartialUpdate),
    PlateUpdate {
        cam: Direction,
        #[serde(default)]
        plate: String,
        #[serde(default, deserialize_with = "lenient_count")]
        plate_index: Option<u32>,
    },
    ToggleLock,
    ToggleSpeedLock,
    TogglePlateLock,
    ToggleLog,
    ToggleBolo,
    ToggleKeybinds,
    SaveReading,
    SetKeybinds {
        #[serde(default)]
        keybinds: Keybinds,
    },
    SetNotificationType {
        notification_type: NotificationType,
    },
    SetSpeedUnit {
        speed_unit: SpeedUnit,
    },
    SetLedGlow {
        led_glow: bool,
    },
    SelectDirection {
        data: Direction,
    },
    UpdateBoloPlates {
        #[serde(default)]
        plates: Vec<String>,
    },
    LoadPositions {
        #[serde(default)]
        positions: BTreeMap<String, PanelPosition>,
    },
    OpenSpeedLockModal,
    SpeedLockTriggered {
        #[serde(deserialize_with = "lenient_count")]
        speed: Option<u32>,
        #[serde(default)]
        plate: String,
        #[serde(default)]
        direction: String,
    },
    SetSpeedLockThreshold {
        threshold: f64,
        enabled: bool,
    },
}

impl InboundMessage {
    /// Wire `type` of this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Update(_) => "update",
            Self::PlateUpdate { .. } => "plateUpdate",
            Self::ToggleLock => "toggleLock",
            Self::ToggleSpeedLock => "toggleSpeedLock",
            Self::TogglePlateLock => "togglePlateLock",
            Self::ToggleLog => "toggleLog",
            Self::ToggleBolo => "toggleBolo",
            Self::ToggleKeybinds => "toggleKeybinds",
            Self::SaveReading => "saveReading",
            Self::SetKeybinds { .. } => "setKeybinds",
            Self::SetNotificationType { .. } => "setNotificationType",
            Self::SetSpeedUnit { .. } => "setSpeedUnit",
            Self::SetLedGlow { .. } => "setLedGlow",
            Self::SelectDirection { .. } => "selectDirection",
            Self::UpdateBoloPlates { .. } => "updateBoloPlates",
            Self::LoadPositions { .. } => "loadPositions",
            Self::OpenSpeedLockModal => "openSpeedLockModal",
            Self::SpeedLockTriggered { .. } => "speedLockTriggered",
            Self::SetSpeedLockThreshold { .. } => "setSpeedLockThreshold",
        }
    }
}

/// Errors from decoding an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Malformed JSON.
    Json(String),
    /// Top-level value is not an object with a string `type`.
    MissingType,
    /// `type` names no known message.
    UnknownType(String),
    /// Known `type` with a payload that does not decode.
    InvalidPayload { kind: String, message: String },
}

impl core::fmt::Display for MessageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingType => f.write_str("message has no string `type` field"),
            Self::UnknownType(kind) => write!(f, "unknown message type: {kind}"),
            Self::InvalidPayload { kind, message } => {
                write!(f, "invalid {kind} payload: {message}")
            }
        }
    }
}

impl std::error::Error for MessageError {}

/// Decode one JSON message.
pub fn parse_inbound(json: &str) -> Result<InboundMessage, MessageError> {
    let value: Value = serde_json::from_str(json).map_err(|e| MessageError::Json(e.to_string()))?;
    parse_inbound_value(value)
}

/// Decode an already parsed JSON value.
pub fn parse_inbound_value(value: Value) -> Result<InboundMessage, MessageError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(MessageError::MissingType)?
        .to_string();
    if !MESSAGE_TYPES.contains(&kind.as_str()) {
        return Err(MessageError::UnknownType(kind));
    }
    serde_json::from_value(value).map_err(|e| MessageError::InvalidPayload {
        kind,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unit_messages_decode() {
        assert_eq!(parse_inbound(r#"{"type":"open"}"#), Ok(InboundMessage::Open));
        assert_eq!(
            parse_inbound(r#"{"type":"toggleSpeedLock","extra":1}"#),
            Ok(InboundMessage::ToggleSpeedLock)
        );
    }

    #[test]
    fn update_carries_only_present_fields() {
        let message = parse_inbound(r#"{"type":"update","frontSpeed":54.4,"rearPlate":"AB 12"}"#)
            .expect("update");
        let InboundMessage::Update(update) = message else {
            panic!("expected update, got {message:?}");
        };
        assert_eq!(update.front_speed, Some(54));
        assert_eq!(update.rear_plate.as_deref(), Some("AB 12"));
        assert_eq!(update.rear_speed, None);
    }

    #[test]
    fn camel_case_fields() {
        assert_eq!(
            parse_inbound(r#"{"type":"setNotificationType","notificationType":"custom"}"#),
            Ok(InboundMessage::SetNotificationType {
                notification_type: NotificationType::Custom
            })
        );
        assert_eq!(
            parse_inbound(r#"{"type":"plateUpdate","cam":"rear","plate":"X1","plateIndex":2}"#),
            Ok(InboundMessage::PlateUpdate {
                cam: Direction::Rear,
                plate: "X1".into(),
                plate_index: Some(2),
            })
        );
        assert_eq!(
            parse_inbound(r#"{"type":"selectDirection","data":"Rear"}"#),
            Ok(InboundMessage::SelectDirection {
                data: Direction::Rear
            })
        );
    }

    #[test]
    fn speed_lock_trigger_tolerates_missing_plate() {
        assert_eq!(
            parse_inbound(r#"{"type":"speedLockTriggered","speed":88,"direction":"Front"}"#),
            Ok(InboundMessage::SpeedLockTriggered {
                speed: Some(88),
                plate: String::new(),
                direction: "Front".into(),
            })
        );
    }

    #[test]
    fn errors_are_classified() {
        assert!(matches!(parse_inbound("{not json"), Err(MessageError::Json(_))));
        assert_eq!(parse_inbound(r#"{"kind":"open"}"#), Err(MessageError::MissingType));
        assert_eq!(parse_inbound("[1,2]"), Err(MessageError::MissingType));
        assert_eq!(
            parse_inbound(r#"{"type":"selfDestruct"}"#),
            Err(MessageError::UnknownType("selfDestruct".into()))
        );
        assert!(matches!(
            parse_inbound(r#"{"type":"setSpeedUnit","speedUnit":"knots"}"#),
            Err(MessageError::InvalidPayload { kind, .. }) if kind == "setSpeedUnit"
        ));
    }

    #[test]
    fn every_known_type_has_a_variant() {
        for kind in MESSAGE_TYPES {
            // Unit messages decode bare; payload messages fail as InvalidPayload,
            // never UnknownType.
            let result = parse_inbound(&format!(r#"{{"type":"{kind}"}}"#));
            match result {
                Ok(message) => assert_eq!(message.kind(), *kind),
                Err(error) => assert!(
                    matches!(error, MessageError::InvalidPayload { .. }),
                    "{kind}: {error}"
                ),
            }
        }
    }
}
