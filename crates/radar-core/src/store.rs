#![forbid(unsafe_code)]

//! The single owned overlay state and its named actions.
//!
//! Every action runs to completion and returns the [`Effect`]s it produced,
//! in order. The store itself never performs I/O.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bolo::{BoloAdd, BoloInputError, BoloMatcher, BoloWatchlist, PLATE_PLACEHOLDER};
use crate::effect::{Effect, HostRequest};
use crate::geometry::{Point, Rect, ResizeEdges, Viewport};
use crate::interaction::{InteractionController, PanelPointerDispatch};
use crate::lock::{LockChange, LockState, RadarLock, SpeedLockThreshold, ThresholdInput};
use crate::panel::{PanelId, PanelPosition, PanelPositions};
use crate::reading_log::{ReadingLog, ReadingSnapshot, SavedReading};
use crate::readings::{Direction, LiveReadings, PartialUpdate};

/// Unit used in readouts and notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[default]
    #[serde(rename = "MPH", alias = "mph")]
    Mph,
    #[serde(rename = "KMH", alias = "kmh")]
    Kmh,
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mph => "MPH",
            Self::Kmh => "KMH",
        })
    }
}

/// `native` shows notices in the overlay; `custom` forwards them to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Native,
    Custom,
}

/// Antenna mode: same-direction or opposite-direction traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntennaMode {
    Same,
    Opp,
}

impl AntennaMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Same => Self::Opp,
            Self::Opp => Self::Same,
        }
    }
}

/// Action name → key label, as configured on the host.
pub type Keybinds = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySettings {
    pub speed_unit: SpeedUnit,
    pub notification_type: NotificationType,
    pub keybinds: Keybinds,
    pub led_glow: bool,
    pub selected_direction: Direction,
    pub front_mode: AntennaMode,
    pub rear_mode: AntennaMode,
    pub front_xmit: bool,
    pub rear_xmit: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            speed_unit: SpeedUnit::default(),
            notification_type: NotificationType::default(),
            keybinds: Keybinds::new(),
            led_glow: false,
            selected_direction: Direction::Front,
            front_mode: AntennaMode::Same,
            rear_mode: AntennaMode::Opp,
            front_xmit: true,
            rear_xmit: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelVisibility {
    /// Overlay shown at all.
    pub visible: bool,
    pub show_log: bool,
    pub show_bolo: bool,
    pub show_keybinds: bool,
}

/// Text-entry modals. While one is open the host routes keys to the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalState {
    pub speed_lock: bool,
    pub bolo: bool,
}

/// Store construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub viewport: Viewport,
    pub default_threshold: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            default_threshold: SpeedLockThreshold::DEFAULT,
        }
    }
}

/// Pointer action result: what the controller did plus the effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerAction {
    pub dispatch: PanelPointerDispatch,
    pub effects: Vec<Effect>,
}

/// Serializable view of the whole overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub visibility: PanelVisibility,
    pub modals: ModalState,
    pub live: LiveReadings,
    pub lock: LockState,
    pub threshold: SpeedLockThreshold,
    pub settings: OverlaySettings,
    pub displayed_front_plate: String,
    pub displayed_rear_plate: String,
    pub bolo_plates: Vec<String>,
    pub front_bolo: bool,
    pub rear_bolo: bool,
    pub readings: Vec<SavedReading>,
    pub panels: BTreeMap<PanelId, Rect>,
}

/// All overlay state.
#[derive(Debug, Clone)]
pub struct RadarStore {
    options: StoreOptions,
    live: LiveReadings,
    lock: RadarLock,
    watchlist: BoloWatchlist,
    matcher: BoloMatcher,
    log: ReadingLog,
    settings: OverlaySettings,
    visibility: PanelVisibility,
    modals: ModalState,
    panels: InteractionController,
}

impl Default for RadarStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl RadarStore {
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            live: LiveReadings::default(),
            lock: RadarLock::new(options.default_threshold),
            watchlist: BoloWatchlist::new(),
            matcher: BoloMatcher::default(),
            log: ReadingLog::new(),
            settings: OverlaySettings::default(),
            visibility: PanelVisibility::default(),
            modals: ModalState::default(),
            panels: InteractionController::new(options.viewport),
        }
    }

    // ---- accessors --------------------------------------------------------

    #[must_use]
    pub const fn live(&self) -> &LiveReadings {
        &self.live
    }

    #[must_use]
    pub const fn lock(&self) -> &LockState {
        self.lock.state()
    }

    #[must_use]
    pub const fn threshold(&self) -> &SpeedLockThreshold {
        self.lock.threshold()
    }

    #[must_use]
    pub const fn watchlist(&self) -> &BoloWatchlist {
        &self.watchlist
    }

    #[must_use]
    pub const fn matcher(&self) -> &BoloMatcher {
        &self.matcher
    }

    #[must_use]
    pub const fn reading_log(&self) -> &ReadingLog {
        &self.log
    }

    #[must_use]
    pub const fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    #[must_use]
    pub const fn visibility(&self) -> &PanelVisibility {
        &self.visibility
    }

    #[must_use]
    pub const fn modals(&self) -> &ModalState {
        &self.modals
    }

    #[must_use]
    pub const fn panels(&self) -> &InteractionController {
        &self.panels
    }

    /// Plate shown for `direction`: the held plate while plate-locked.
    #[must_use]
    pub fn displayed_plate(&self, direction: Direction) -> &str {
        if self.lock.state().plate_locked {
            self.lock.state().locked_plate(direction)
        } else {
            self.live.plate(direction)
        }
    }

    /// Live speed as the readout shows it: zero while transmit is off.
    #[must_use]
    pub fn displayed_speed(&self, direction: Direction) -> u32 {
        let xmit = match direction {
            Direction::Front => self.settings.front_xmit,
            Direction::Rear => self.settings.rear_xmit,
        };
        if xmit { self.live.speed(direction) } else { 0 }
    }

    #[must_use]
    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            visibility: self.visibility,
            modals: self.modals,
            live: self.live.clone(),
            lock: self.lock.state().clone(),
            threshold: *self.lock.threshold(),
            settings: self.settings.clone(),
            displayed_front_plate: self.displayed_plate(Direction::Front).to_string(),
            displayed_rear_plate: self.displayed_plate(Direction::Rear).to_string(),
            bolo_plates: self.watchlist.plates().to_vec(),
            front_bolo: self.matcher.is_match(Direction::Front),
            rear_bolo: self.matcher.is_match(Direction::Rear),
            readings: self.log.readings().to_vec(),
            panels: PanelId::ALL
                .into_iter()
                .map(|id| (id, self.panels.rect(id)))
                .collect(),
        }
    }

    // ---- visibility -------------------------------------------------------

    pub fn open(&mut self) -> Vec<Effect> {
        self.visibility.visible = true;
        Vec::new()
    }

    pub fn close(&mut self) -> Vec<Effect> {
        self.visibility.visible = false;
        Vec::new()
    }

    pub fn toggle_log(&mut self) -> Vec<Effect> {
        self.visibility.show_log = !self.visibility.show_log;
        vec![Effect::notice(if self.visibility.show_log {
            "Log opened"
        } else {
            "Log closed"
        })]
    }

    pub fn toggle_bolo(&mut self) -> Vec<Effect> {
        self.visibility.show_bolo = !self.visibility.show_bolo;
        vec![Effect::notice(if self.visibility.show_bolo {
            "BOLO list opened"
        } else {
            "BOLO list closed"
        })]
    }

    pub fn toggle_keybinds(&mut self) -> Vec<Effect> {
        self.visibility.show_keybinds = !self.visibility.show_keybinds;
        vec![Effect::notice(if self.visibility.show_keybinds {
            "Keybinds shown"
        } else {
            "Keybinds hidden"
        })]
    }

    // ---- readings ---------------------------------------------------------

    /// Overlay the present fields of a host update.
    pub fn apply_update(&mut self, update: &PartialUpdate) -> Vec<Effect> {
        self.live.apply(update);
        self.evaluate_bolo()
    }

    /// Single-camera plate read.
    pub fn apply_plate_update(
        &mut self,
        camera: Direction,
        plate: &str,
        index: Option<u32>,
    ) -> Vec<Effect> {
        self.live.set_plate(camera, plate, index);
        self.evaluate_bolo()
    }

    // ---- locks ------------------------------------------------------------

    pub fn toggle_full_lock(&mut self) -> Vec<Effect> {
        let change = self.lock.toggle_full(&self.live);
        let notice = if change.locked {
            "Radar locked"
        } else {
            "Radar unlocked"
        };
        self.lock_effects(change, notice)
    }

    pub fn toggle_speed_lock(&mut self) -> Vec<Effect> {
        let change = self.lock.toggle_speed(&self.live);
        let notice = if change.locked {
            "Speed locked"
        } else {
            "Speed unlocked"
        };
        self.lock_effects(change, notice)
    }

    pub fn toggle_plate_lock(&mut self) -> Vec<Effect> {
        let change = self.lock.toggle_plate(&self.live);
        let notice = if change.locked {
            "Plates locked"
        } else {
            "Plates unlocked"
        };
        self.lock_effects(change, notice)
    }

    /// Drop both holds and zero the snapshots. The threshold watch is left
    /// as it is.
    pub fn unlock_all(&mut self) -> Vec<Effect> {
        self.lock.unlock_all();
        self.evaluate_bolo()
    }

    /// Host reports a reading over the threshold.
    pub fn speed_lock_triggered(&mut self, speed: u32, plate: &str, direction: &str) -> Vec<Effect> {
        if !self.lock.trigger(&self.live) {
            return Vec::new();
        }
        let unit = self.settings.speed_unit;
        let plate_info = if plate.is_empty() || plate == PLATE_PLACEHOLDER {
            String::new()
        } else {
            format!(" ({plate})")
        };
        let mut effects = vec![Effect::Notice(format!(
            "Auto-locked: {direction} radar - {speed} {unit}{plate_info} exceeds {} {unit} threshold",
            self.lock.threshold().value
        ))];
        effects.extend(self.evaluate_bolo());
        effects
    }

    /// Threshold entered in the modal. Invalid input changes nothing.
    pub fn set_speed_lock_threshold(&mut self, input: &ThresholdInput) -> Vec<Effect> {
        let unit = self.settings.speed_unit;
        match self.lock.set_threshold(input) {
            Ok(update) => {
                let mut effects = vec![
                    HostRequest::SetSpeedLockThreshold(update).into(),
                    Effect::Notice(format!(
                        "Speed lock threshold set to {} {unit}",
                        update.threshold
                    )),
                ];
                effects.extend(self.close_speed_lock_modal());
                effects
            }
            Err(error) => {
                debug!(target: "radar.lock", %error, "threshold input rejected");
                vec![Effect::Notice(format!(
                    "Please enter a valid speed between {}-{} {unit}",
                    SpeedLockThreshold::MIN,
                    SpeedLockThreshold::MAX
                ))]
            }
        }
    }

    pub fn disable_speed_lock_threshold(&mut self) -> Vec<Effect> {
        let update = self.lock.disable_threshold();
        let mut effects = vec![
            HostRequest::SetSpeedLockThreshold(update).into(),
            Effect::notice("Speed lock threshold disabled"),
        ];
        effects.extend(self.close_speed_lock_modal());
        effects
    }

    /// Host-side threshold confirmation; no outbound traffic.
    pub fn host_speed_lock_threshold(&mut self, threshold: i64, enabled: bool) -> Vec<Effect> {
        self.lock.confirm_threshold(threshold, enabled);
        Vec::new()
    }

    // ---- modals -----------------------------------------------------------

    pub fn open_speed_lock_modal(&mut self) -> Vec<Effect> {
        Self::open_modal(&mut self.modals.speed_lock)
    }

    pub fn close_speed_lock_modal(&mut self) -> Vec<Effect> {
        Self::close_modal(&mut self.modals.speed_lock)
    }

    pub fn open_bolo_modal(&mut self) -> Vec<Effect> {
        Self::open_modal(&mut self.modals.bolo)
    }

    pub fn close_bolo_modal(&mut self) -> Vec<Effect> {
        Self::close_modal(&mut self.modals.bolo)
    }

    fn open_modal(flag: &mut bool) -> Vec<Effect> {
        if *flag {
            return Vec::new();
        }
        *flag = true;
        vec![Effect::Host(HostRequest::InputActive)]
    }

    fn close_modal(flag: &mut bool) -> Vec<Effect> {
        if !*flag {
            return Vec::new();
        }
        *flag = false;
        vec![Effect::Host(HostRequest::InputInactive)]
    }

    // ---- BOLO -------------------------------------------------------------

    pub fn add_bolo_plate(&mut self, text: &str) -> Vec<Effect> {
        match self.watchlist.add(text) {
            Err(BoloInputError::Empty) => vec![Effect::notice("Enter a plate number")],
            Ok(BoloAdd::Duplicate(_)) => self.close_bolo_modal(),
            Ok(BoloAdd::Added(plate)) => {
                let mut effects = vec![Effect::Host(HostRequest::AddBoloPlate { plate })];
                effects.extend(self.close_bolo_modal());
                effects.extend(self.evaluate_bolo());
                effects
            }
        }
    }

    pub fn remove_bolo_plate(&mut self, text: &str) -> Vec<Effect> {
        match self.watchlist.remove(text) {
            Some(plate) => {
                let mut effects = vec![Effect::Host(HostRequest::RemoveBoloPlate { plate })];
                effects.extend(self.evaluate_bolo());
                effects
            }
            None => Vec::new(),
        }
    }

    /// Host pushes its authoritative watchlist.
    pub fn replace_bolo_plates<I, S>(&mut self, plates: I) -> Vec<Effect>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.watchlist.replace_all(plates);
        self.evaluate_bolo()
    }

    // ---- reading log ------------------------------------------------------

    pub fn save_reading(&mut self, timestamp: impl Into<String>) -> Vec<Effect> {
        let snapshot = ReadingSnapshot::capture(timestamp, &self.live, self.lock.state());
        self.log.add(snapshot);
        vec![Effect::notice("Saved radar reading")]
    }

    pub fn remove_saved_reading(&mut self, id: u64) -> Vec<Effect> {
        self.log.remove(id);
        Vec::new()
    }

    // ---- settings ---------------------------------------------------------

    pub fn set_keybinds(&mut self, keybinds: Keybinds) -> Vec<Effect> {
        self.settings.keybinds = keybinds;
        Vec::new()
    }

    pub fn set_notification_type(&mut self, notification_type: NotificationType) -> Vec<Effect> {
        self.settings.notification_type = notification_type;
        Vec::new()
    }

    pub fn set_speed_unit(&mut self, unit: SpeedUnit) -> Vec<Effect> {
        self.settings.speed_unit = unit;
        Vec::new()
    }

    pub fn set_led_glow(&mut self, on: bool) -> Vec<Effect> {
        self.settings.led_glow = on;
        Vec::new()
    }

    pub fn select_direction(&mut self, direction: Direction) -> Vec<Effect> {
        self.settings.selected_direction = direction;
        Vec::new()
    }

    pub fn toggle_front_mode(&mut self) -> Vec<Effect> {
        self.settings.front_mode = self.settings.front_mode.toggled();
        Vec::new()
    }

    pub fn toggle_rear_mode(&mut self) -> Vec<Effect> {
        self.settings.rear_mode = self.settings.rear_mode.toggled();
        Vec::new()
    }

    pub fn toggle_front_xmit(&mut self) -> Vec<Effect> {
        self.settings.front_xmit = !self.settings.front_xmit;
        Vec::new()
    }

    pub fn toggle_rear_xmit(&mut self) -> Vec<Effect> {
        self.settings.rear_xmit = !self.settings.rear_xmit;
        Vec::new()
    }

    // ---- panels -----------------------------------------------------------

    /// Restore saved placements. Keys that name no panel are skipped.
    pub fn load_positions(&mut self, positions: &BTreeMap<String, PanelPosition>) -> Vec<Effect> {
        let mut known = PanelPositions::new();
        for (key, position) in positions {
            match key.parse::<PanelId>() {
                Ok(panel) => {
                    known.insert(panel, position.clone());
                }
                Err(error) => warn!(target: "radar.panel", %error, "saved position ignored"),
            }
        }
        self.panels.restore(&known);
        Vec::new()
    }

    pub fn set_viewport(&mut self, width: i32, height: i32) -> Vec<Effect> {
        self.panels.set_viewport(width, height);
        Vec::new()
    }

    pub fn set_positioning(&mut self, panel: PanelId, on: bool) -> Vec<Effect> {
        self.panels.set_positioning(panel, on);
        Vec::new()
    }

    pub fn toggle_positioning(&mut self, panel: PanelId) -> Vec<Effect> {
        self.panels.toggle_positioning(panel);
        Vec::new()
    }

    pub fn pointer_down_body(&mut self, panel: PanelId, position: Point) -> PointerAction {
        let dispatch = self.panels.pointer_down_body(panel, position);
        Self::pointer_action(dispatch)
    }

    pub fn pointer_down_handle(
        &mut self,
        panel: PanelId,
        handle: ResizeEdges,
        position: Point,
    ) -> PointerAction {
        let dispatch = self.panels.pointer_down_handle(panel, handle, position);
        Self::pointer_action(dispatch)
    }

    pub fn pointer_move(&mut self, position: Point) -> PointerAction {
        let dispatch = self.panels.pointer_move(position);
        Self::pointer_action(dispatch)
    }

    pub fn pointer_move_immediate(&mut self, position: Point) -> PointerAction {
        let dispatch = self.panels.pointer_move_immediate(position);
        Self::pointer_action(dispatch)
    }

    pub fn frame(&mut self) -> PointerAction {
        let dispatch = self.panels.frame();
        Self::pointer_action(dispatch)
    }

    pub fn pointer_up(&mut self) -> PointerAction {
        let dispatch = self.panels.pointer_up();
        Self::pointer_action(dispatch)
    }

    pub fn pointer_leave(&mut self) -> PointerAction {
        let dispatch = self.panels.pointer_leave();
        Self::pointer_action(dispatch)
    }

    fn pointer_action(dispatch: PanelPointerDispatch) -> PointerAction {
        let effects = dispatch
            .commit
            .iter()
            .map(|commit| {
                Effect::Host(HostRequest::SavePositions {
                    panel: commit.panel,
                    position: commit.position.clone(),
                })
            })
            .collect();
        PointerAction { dispatch, effects }
    }

    // ---- lifecycle --------------------------------------------------------

    /// Back to the initial state. Panel placements and the reading id
    /// counter survive.
    pub fn reset(&mut self) -> Vec<Effect> {
        self.live = LiveReadings::default();
        self.lock.reset(self.options.default_threshold);
        self.watchlist.clear();
        self.matcher.clear();
        self.log.clear();
        self.settings = OverlaySettings::default();
        self.visibility = PanelVisibility::default();
        self.modals = ModalState::default();
        debug!(target: "radar.bridge", "store reset");
        Vec::new()
    }

    fn lock_effects(&mut self, change: LockChange, notice: &str) -> Vec<Effect> {
        let mut effects: Vec<Effect> = change
            .rearm
            .map(|update| Effect::Host(HostRequest::SetSpeedLockThreshold(update)))
            .into_iter()
            .collect();
        effects.push(Effect::notice(notice));
        effects.extend(self.evaluate_bolo());
        effects
    }

    fn evaluate_bolo(&mut self) -> Vec<Effect> {
        let front = self.displayed_plate(Direction::Front).to_string();
        let rear = self.displayed_plate(Direction::Rear).to_string();
        self.matcher
            .evaluate(&self.watchlist, &front, &rear)
            .into_iter()
            .map(|alert| Effect::Host(HostRequest::BoloAlert(alert)))
            .collect()
    }
}
