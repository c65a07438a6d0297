#![forbid(unsafe_code)]

//! Host bridge: inbound messages and UI actions in, host calls and banners out.
//!
//! [`HostBridge`] owns the [`RadarStore`] and routes every [`Effect`] the
//! store produces:
//!
//! - [`Effect::Host`] goes straight to the [`HostSink`].
//! - [`Effect::Notice`] becomes a local [`Banner`] in `native` notification
//!   mode, or a `showNotification` host call in `custom` mode.
//!
//! Inbound messages that fail to decode are logged at `warn` and dropped;
//! nothing the host sends can put the bridge in an error state.

use std::time::Duration;

use radar_core::interaction::PanelPointerDispatch;
use radar_core::lock::ThresholdInput;
use radar_core::store::{NotificationType, PointerAction};
use radar_core::{Direction, Effect, HostRequest, PanelId, Point, RadarStore, ResizeEdges};
use serde::{Deserialize, Deserializer};
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::message::{InboundMessage, MessageError, parse_inbound};
use crate::notification::{Banner, DeterministicClock, NotificationCenter, local_timestamp};
use crate::sink::HostSink;

/// Local user interaction, as the overlay's widgets would report it.
///
/// Tagged on `action` so the replay harness can script it next to host
/// messages: `{"action":"pointerDownHandle","panel":"radar","handle":"w","x":710,"y":500}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UiAction {
    PointerDownBody {
        panel: PanelId,
        x: i32,
        y: i32,
    },
    PointerDownHandle {
        panel: PanelId,
        #[serde(deserialize_with = "handle_name")]
        handle: ResizeEdges,
        x: i32,
        y: i32,
    },
    PointerMove {
        x: i32,
        y: i32,
    },
    PointerMoveImmediate {
        x: i32,
        y: i32,
    },
    Frame,
    PointerUp,
    PointerLeave,
    SetPositioning {
        panel: PanelId,
        on: bool,
    },
    TogglePositioning {
        panel: PanelId,
    },
    SetViewport {
        width: i32,
        height: i32,
    },
    ToggleFullLock,
    ToggleSpeedLock,
    TogglePlateLock,
    /// Release both holds and clear the captured values.
    UnlockAll,
    ToggleLog,
    ToggleBolo,
    ToggleKeybinds,
    OpenSpeedLockModal,
    CloseSpeedLockModal,
    SetSpeedLockThreshold {
        value: ThresholdInput,
    },
    DisableSpeedLockThreshold,
    OpenBoloModal,
    CloseBoloModal,
    AddBoloPlate {
        plate: String,
    },
    RemoveBoloPlate {
        plate: String,
    },
    SaveReading,
    RemoveSavedReading {
        id: u64,
    },
    SelectDirection {
        direction: Direction,
    },
    ToggleFrontMode,
    ToggleRearMode,
    ToggleFrontXmit,
    ToggleRearXmit,
    /// Advance the banner clock.
    Advance {
        ms: u64,
    },
    Reset,
}

fn handle_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ResizeEdges, D::Error> {
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

/// Glue between the host channel, the store, and the outbound sink.
#[derive(Debug)]
pub struct HostBridge<S: HostSink> {
    store: RadarStore,
    sink: S,
    notifications: NotificationCenter,
    clock: DeterministicClock,
    timestamp: fn() -> String,
}

impl<S: HostSink> HostBridge<S> {
    /// Bridge with default configuration.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, &BridgeConfig::default())
    }

    pub fn with_config(sink: S, config: &BridgeConfig) -> Self {
        Self {
            store: RadarStore::new(config.store_options()),
            sink,
            notifications: NotificationCenter::new(config.banner_duration()),
            clock: DeterministicClock::new(),
            timestamp: local_timestamp,
        }
    }

    /// Replace the wall-clock source used to stamp saved readings.
    #[must_use]
    pub fn with_timestamp_source(mut self, source: fn() -> String) -> Self {
        self.timestamp = source;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &RadarStore {
        &self.store
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Banner visible right now.
    #[must_use]
    pub fn banner(&self) -> Option<&Banner> {
        self.notifications.current(self.clock.now())
    }

    /// Move the banner clock forward, expiring a stale banner.
    pub fn advance(&mut self, dt: Duration) {
        self.clock.advance(dt);
        if self.notifications.expire(self.clock.now()) {
            trace!(target: "radar.bridge", "banner expired");
        }
    }

    // ---- inbound ----------------------------------------------------------

    /// Decode and apply one raw host message. Undecodable input is logged
    /// and dropped; the error is returned for callers that count them.
    pub fn handle_json(&mut self, json: &str) -> Result<&'static str, MessageError> {
        match parse_inbound(json) {
            Ok(message) => {
                let kind = message.kind();
                self.handle_message(message);
                Ok(kind)
            }
            Err(error) => {
                warn!(target: "radar.bridge", %error, "inbound message dropped");
                Err(error)
            }
        }
    }

    pub fn handle_message(&mut self, message: InboundMessage) {
        debug!(target: "radar.bridge", kind = message.kind(), "inbound");
        let effects = match message {
            InboundMessage::Open => self.store.open(),
            InboundMessage::Close => self.store.close(),
            InboundMessage::Update(update) => self.store.apply_update(&update),
            InboundMessage::PlateUpdate {
                cam,
                plate,
                plate_index,
            } => self.store.apply_plate_update(cam, &plate, plate_index),
            InboundMessage::ToggleLock => self.store.toggle_full_lock(),
            InboundMessage::ToggleSpeedLock => self.store.toggle_speed_lock(),
            InboundMessage::TogglePlateLock => self.store.toggle_plate_lock(),
            InboundMessage::ToggleLog => self.store.toggle_log(),
            InboundMessage::ToggleBolo => self.store.toggle_bolo(),
            InboundMessage::ToggleKeybinds => self.store.toggle_keybinds(),
            InboundMessage::SaveReading => self.store.save_reading((self.timestamp)()),
            InboundMessage::SetKeybinds { keybinds } => self.store.set_keybinds(keybinds),
            InboundMessage::SetNotificationType { notification_type } => {
                self.store.set_notification_type(notification_type)
            }
            InboundMessage::SetSpeedUnit { speed_unit } => self.store.set_speed_unit(speed_unit),
            InboundMessage::SetLedGlow { led_glow } => self.store.set_led_glow(led_glow),
            InboundMessage::SelectDirection { data } => self.store.select_direction(data),
            InboundMessage::UpdateBoloPlates { plates } => self.store.replace_bolo_plates(plates),
            InboundMessage::LoadPositions { positions } => self.store.load_positions(&positions),
            InboundMessage::OpenSpeedLockModal => self.store.open_speed_lock_modal(),
            InboundMessage::SpeedLockTriggered {
                speed,
                plate,
                direction,
            } => match speed {
                Some(speed) => self.store.speed_lock_triggered(speed, &plate, &direction),
                None => {
                    warn!(target: "radar.bridge", "speedLockTriggered without a speed ignored");
                    Vec::new()
                }
            },
            InboundMessage::SetSpeedLockThreshold { threshold, enabled } => {
                // Non-finite values saturate or become 0 and fail validation.
                #[allow(clippy::cast_possible_truncation)]
                let threshold = threshold.trunc() as i64;
                self.store.host_speed_lock_threshold(threshold, enabled)
            }
        };
        self.dispatch(effects);
    }

    // ---- local UI ---------------------------------------------------------

    pub fn handle_ui(&mut self, action: UiAction) {
        debug!(target: "radar.bridge", ?action, "ui");
        match action {
            UiAction::PointerDownBody { panel, x, y } => {
                self.pointer_down_body(panel, Point::new(x, y));
            }
            UiAction::PointerDownHandle {
                panel,
                handle,
                x,
                y,
            } => {
                self.pointer_down_handle(panel, handle, Point::new(x, y));
            }
            UiAction::PointerMove { x, y } => {
                self.pointer_move(Point::new(x, y));
            }
            UiAction::PointerMoveImmediate { x, y } => {
                self.pointer_move_immediate(Point::new(x, y));
            }
            UiAction::Frame => {
                self.frame();
            }
            UiAction::PointerUp => {
                self.pointer_up();
            }
            UiAction::PointerLeave => {
                self.pointer_leave();
            }
            UiAction::SetPositioning { panel, on } => {
                let effects = self.store.set_positioning(panel, on);
                self.dispatch(effects);
            }
            UiAction::TogglePositioning { panel } => {
                let effects = self.store.toggle_positioning(panel);
                self.dispatch(effects);
            }
            UiAction::SetViewport { width, height } => {
                let effects = self.store.set_viewport(width, height);
                self.dispatch(effects);
            }
            UiAction::ToggleFullLock => self.run(RadarStore::toggle_full_lock),
            UiAction::ToggleSpeedLock => self.run(RadarStore::toggle_speed_lock),
            UiAction::TogglePlateLock => self.run(RadarStore::toggle_plate_lock),
            UiAction::UnlockAll => self.run(RadarStore::unlock_all),
            UiAction::ToggleLog => self.run(RadarStore::toggle_log),
            UiAction::ToggleBolo => self.run(RadarStore::toggle_bolo),
            UiAction::ToggleKeybinds => self.run(RadarStore::toggle_keybinds),
            UiAction::OpenSpeedLockModal => self.run(RadarStore::open_speed_lock_modal),
            UiAction::CloseSpeedLockModal => self.run(RadarStore::close_speed_lock_modal),
            UiAction::SetSpeedLockThreshold { value } => self.set_speed_lock_threshold(&value),
            UiAction::DisableSpeedLockThreshold => {
                self.run(RadarStore::disable_speed_lock_threshold);
            }
            UiAction::OpenBoloModal => self.run(RadarStore::open_bolo_modal),
            UiAction::CloseBoloModal => self.run(RadarStore::close_bolo_modal),
            UiAction::AddBoloPlate { plate } => self.add_bolo_plate(&plate),
            UiAction::RemoveBoloPlate { plate } => self.remove_bolo_plate(&plate),
            UiAction::SaveReading => self.save_reading(),
            UiAction::RemoveSavedReading { id } => self.remove_saved_reading(id),
            UiAction::SelectDirection { direction } => {
                let effects = self.store.select_direction(direction);
                self.dispatch(effects);
            }
            UiAction::ToggleFrontMode => self.run(RadarStore::toggle_front_mode),
            UiAction::ToggleRearMode => self.run(RadarStore::toggle_rear_mode),
            UiAction::ToggleFrontXmit => self.run(RadarStore::toggle_front_xmit),
            UiAction::ToggleRearXmit => self.run(RadarStore::toggle_rear_xmit),
            UiAction::Advance { ms } => self.advance(Duration::from_millis(ms)),
            UiAction::Reset => self.run(RadarStore::reset),
        }
    }

    pub fn pointer_down_body(&mut self, panel: PanelId, position: Point) -> PanelPointerDispatch {
        let action = self.store.pointer_down_body(panel, position);
        self.pointer(action)
    }

    pub fn pointer_down_handle(
        &mut self,
        panel: PanelId,
        handle: ResizeEdges,
        position: Point,
    ) -> PanelPointerDispatch {
        let action = self.store.pointer_down_handle(panel, handle, position);
        self.pointer(action)
    }

    pub fn pointer_move(&mut self, position: Point) -> PanelPointerDispatch {
        let action = self.store.pointer_move(position);
        self.pointer(action)
    }

    pub fn pointer_move_immediate(&mut self, position: Point) -> PanelPointerDispatch {
        let action = self.store.pointer_move_immediate(position);
        self.pointer(action)
    }

    pub fn frame(&mut self) -> PanelPointerDispatch {
        let action = self.store.frame();
        self.pointer(action)
    }

    pub fn pointer_up(&mut self) -> PanelPointerDispatch {
        let action = self.store.pointer_up();
        self.pointer(action)
    }

    pub fn pointer_leave(&mut self) -> PanelPointerDispatch {
        let action = self.store.pointer_leave();
        self.pointer(action)
    }

    pub fn set_speed_lock_threshold(&mut self, input: &ThresholdInput) {
        let effects = self.store.set_speed_lock_threshold(input);
        self.dispatch(effects);
    }

    pub fn add_bolo_plate(&mut self, plate: &str) {
        let effects = self.store.add_bolo_plate(plate);
        self.dispatch(effects);
    }

    pub fn remove_bolo_plate(&mut self, plate: &str) {
        let effects = self.store.remove_bolo_plate(plate);
        self.dispatch(effects);
    }

    pub fn save_reading(&mut self) {
        let effects = self.store.save_reading((self.timestamp)());
        self.dispatch(effects);
    }

    pub fn remove_saved_reading(&mut self, id: u64) {
        let effects = self.store.remove_saved_reading(id);
        self.dispatch(effects);
    }

    // ---- outbound ---------------------------------------------------------

    /// Route store effects to the sink or the banner.
    pub fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Host(request) => {
                    trace!(target: "radar.bridge", endpoint = request.endpoint(), "outbound");
                    self.sink.send(request);
                }
                Effect::Notice(message) => match self.store.settings().notification_type {
                    NotificationType::Native => {
                        self.notifications.show(message, self.clock.now());
                    }
                    NotificationType::Custom => {
                        self.sink.send(HostRequest::ShowNotification { message });
                    }
                },
            }
        }
    }

    fn run(&mut self, action: fn(&mut RadarStore) -> Vec<Effect>) {
        let effects = action(&mut self.store);
        self.dispatch(effects);
    }

    fn pointer(&mut self, action: PointerAction) -> PanelPointerDispatch {
        let PointerAction { dispatch, effects } = action;
        self.dispatch(effects);
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use pretty_assertions::assert_eq;

    fn bridge() -> HostBridge<RecordingSink> {
        HostBridge::new(RecordingSink::new()).with_timestamp_source(|| "12:00:00 01/01/2026".into())
    }

    #[test]
    fn native_notices_become_banners() {
        let mut bridge = bridge();
        bridge.handle_json(r#"{"type":"toggleLog"}"#).expect("known");
        assert_eq!(bridge.banner().map(|b| b.message.as_str()), Some("Log opened"));
        assert!(bridge.sink().requests().is_empty());

        bridge.advance(Duration::from_millis(3000));
        assert!(bridge.banner().is_none());
    }

    #[test]
    fn custom_notices_go_to_the_host() {
        let mut bridge = bridge();
        bridge
            .handle_json(r#"{"type":"setNotificationType","notificationType":"custom"}"#)
            .expect("known");
        bridge.handle_json(r#"{"type":"saveReading"}"#).expect("known");
        assert_eq!(
            bridge.sink().requests(),
            [HostRequest::ShowNotification {
                message: "Saved radar reading".into()
            }]
        );
        assert!(bridge.banner().is_none());
        assert_eq!(
            bridge.store().reading_log().readings()[0].snapshot.timestamp,
            "12:00:00 01/01/2026"
        );
    }

    #[test]
    fn bad_messages_are_dropped() {
        let mut bridge = bridge();
        let before = bridge.store().snapshot();
        assert!(bridge.handle_json("not json").is_err());
        assert!(bridge.handle_json(r#"{"type":"selfDestruct"}"#).is_err());
        assert!(bridge.handle_json(r#"{"type":"speedLockTriggered"}"#).is_err());
        assert_eq!(bridge.store().snapshot(), before);
        assert!(bridge.sink().requests().is_empty());
    }

    #[test]
    fn ui_actions_decode_and_apply() {
        let mut bridge = bridge();
        let action: UiAction = serde_json::from_str(r#"{"action":"addBoloPlate","plate":"abc 123"}"#)
            .expect("decode");
        bridge.handle_ui(action);
        assert_eq!(bridge.sink().endpoints(), ["addBoloPlate"]);

        let action: UiAction = serde_json::from_str(
            r#"{"action":"pointerDownHandle","panel":"radar","handle":"nw","x":0,"y":0}"#,
        )
        .expect("decode");
        assert_eq!(
            action,
            UiAction::PointerDownHandle {
                panel: PanelId::Radar,
                handle: ResizeEdges::NORTH_WEST,
                x: 0,
                y: 0,
            }
        );
        assert!(
            serde_json::from_str::<UiAction>(
                r#"{"action":"pointerDownHandle","panel":"radar","handle":"up","x":0,"y":0}"#
            )
            .is_err()
        );
    }

    #[test]
    fn unlock_all_action_clears_holds_silently() {
        let mut bridge = bridge();
        bridge.handle_json(r#"{"type":"update","frontSpeed":88,"frontPlate":"HELD01"}"#).expect("known");
        bridge.handle_ui(UiAction::ToggleFullLock);
        assert!(bridge.store().lock().is_full());

        let action: UiAction = serde_json::from_str(r#"{"action":"unlockAll"}"#).expect("decode");
        assert_eq!(action, UiAction::UnlockAll);
        let banner = bridge.banner().map(|b| b.key);
        bridge.handle_ui(action);
        assert_eq!(bridge.store().lock(), &radar_core::lock::LockState::default());
        assert_eq!(bridge.banner().map(|b| b.key), banner);
        assert!(bridge.sink().requests().is_empty());
    }

    #[test]
    fn host_threshold_is_truncated() {
        let mut bridge = bridge();
        bridge
            .handle_json(r#"{"type":"setSpeedLockThreshold","threshold":64.9,"enabled":true}"#)
            .expect("known");
        assert_eq!(bridge.store().threshold().value, 64);
        assert!(bridge.store().threshold().enabled);
    }
}
