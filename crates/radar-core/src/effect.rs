#![forbid(unsafe_code)]

//! Side effects produced by store actions.
//!
//! Actions never talk to the host directly. They return [`Effect`] values; the
//! bridge routes [`Effect::Host`] to its outbound sink and [`Effect::Notice`]
//! to a banner or a `showNotification` call depending on the notification
//! mode.

use serde_json::{Value, json};

use crate::bolo::BoloAlert;
use crate::lock::ThresholdUpdate;
use crate::panel::{PanelId, PanelPosition};

/// Fire-and-forget call to the host, named by endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    SavePositions {
        panel: PanelId,
        position: PanelPosition,
    },
    AddBoloPlate {
        plate: String,
    },
    RemoveBoloPlate {
        plate: String,
    },
    BoloAlert(BoloAlert),
    SetSpeedLockThreshold(ThresholdUpdate),
    ShowNotification {
        message: String,
    },
    /// A text field took keyboard focus.
    InputActive,
    InputInactive,
}

impl HostRequest {
    /// Endpoint name the host registered for this call.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::SavePositions { .. } => "savePositions",
            Self::AddBoloPlate { .. } => "addBoloPlate",
            Self::RemoveBoloPlate { .. } => "removeBoloPlate",
            Self::BoloAlert(_) => "boloAlert",
            Self::SetSpeedLockThreshold(_) => "setSpeedLockThreshold",
            Self::ShowNotification { .. } => "showNotification",
            Self::InputActive => "inputActive",
            Self::InputInactive => "inputInactive",
        }
    }

    /// JSON body.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::SavePositions { panel, position } => {
                let mut body = serde_json::Map::new();
                body.insert(panel.as_str().to_string(), position_value(position));
                Value::Object(body)
            }
            Self::AddBoloPlate { plate } | Self::RemoveBoloPlate { plate } => {
                json!({ "plate": plate })
            }
            Self::BoloAlert(alert) => json!({
                "plate": alert.plate,
                "direction": alert.direction.as_str(),
            }),
            Self::SetSpeedLockThreshold(update) => json!({
                "threshold": update.threshold,
                "enabled": update.enabled,
            }),
            Self::ShowNotification { message } => json!({ "message": message }),
            Self::InputActive | Self::InputInactive => json!({}),
        }
    }
}

fn position_value(position: &PanelPosition) -> Value {
    let mut fields = serde_json::Map::new();
    for (key, value) in [
        ("left", &position.left),
        ("top", &position.top),
        ("right", &position.right),
        ("width", &position.width),
        ("height", &position.height),
    ] {
        if let Some(value) = value {
            fields.insert(key.to_string(), Value::String(value.clone()));
        }
    }
    Value::Object(fields)
}

/// One consequence of a store action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Host(HostRequest),
    /// User-facing message.
    Notice(String),
}

impl Effect {
    #[must_use]
    pub fn notice(message: impl Into<String>) -> Self {
        Self::Notice(message.into())
    }

    #[must_use]
    pub const fn as_host(&self) -> Option<&HostRequest> {
        match self {
            Self::Host(request) => Some(request),
            Self::Notice(_) => None,
        }
    }

    #[must_use]
    pub fn as_notice(&self) -> Option<&str> {
        match self {
            Self::Notice(message) => Some(message),
            Self::Host(_) => None,
        }
    }
}

impl From<HostRequest> for Effect {
    fn from(request: HostRequest) -> Self {
        Self::Host(request)
    }
}
