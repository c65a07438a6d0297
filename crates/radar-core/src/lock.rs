#![forbid(unsafe_code)]

//! Radar lock state machine: full, speed-only and plate-only holds plus the
//! speed-lock threshold watch.
//!
//! Locking snapshots the live values on the false→true edge. Unlocking keeps
//! the stale snapshot (the HLD/LOCK readouts fade but keep their digits) and
//! only [`RadarLock::unlock_all`] clears it. Releasing a speed hold re-arms
//! the threshold watch unless the user switched it off.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::readings::{Direction, LiveReadings};

/// Held values and lock flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockState {
    pub speed_locked: bool,
    pub plate_locked: bool,
    pub locked_front_speed: u32,
    pub locked_rear_speed: u32,
    pub locked_front_plate: String,
    pub locked_rear_plate: String,
    pub locked_front_plate_index: u32,
    pub locked_rear_plate_index: u32,
}

impl LockState {
    /// Both holds active.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.speed_locked && self.plate_locked
    }

    #[must_use]
    pub const fn any(&self) -> bool {
        self.speed_locked || self.plate_locked
    }

    #[must_use]
    pub fn locked_plate(&self, direction: Direction) -> &str {
        match direction {
            Direction::Front => &self.locked_front_plate,
            Direction::Rear => &self.locked_rear_plate,
        }
    }

    fn snapshot_speeds(&mut self, live: &LiveReadings) {
        self.locked_front_speed = live.front_speed;
        self.locked_rear_speed = live.rear_speed;
    }

    fn snapshot_plates(&mut self, live: &LiveReadings) {
        live.front_plate.clone_into(&mut self.locked_front_plate);
        live.rear_plate.clone_into(&mut self.locked_rear_plate);
        self.locked_front_plate_index = live.front_plate_index;
        self.locked_rear_plate_index = live.rear_plate_index;
    }
}

/// Speed at or above which the host auto-locks the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedLockThreshold {
    pub value: u32,
    /// Watch armed.
    pub enabled: bool,
    /// The user switched the watch off; suppresses automatic re-arming.
    pub user_disabled: bool,
}

impl SpeedLockThreshold {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 200;
    pub const DEFAULT: u32 = 80;
    /// Increment used by the threshold modal's up/down buttons.
    pub const STEP: i64 = 5;

    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self {
            value,
            enabled: false,
            user_disabled: false,
        }
    }

    /// Validate a candidate value.
    pub fn validate(value: i64) -> Result<u32, ThresholdError> {
        u32::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .ok_or(ThresholdError::OutOfRange { value })
    }

    /// `current + delta` clamped to the valid range; non-numeric input counts as 0.
    #[must_use]
    pub fn step(current: &ThresholdInput, delta: i64) -> u32 {
        let base = current.parse().unwrap_or(0);
        let stepped = base.saturating_add(delta).clamp(Self::MIN.into(), Self::MAX.into());
        u32::try_from(stepped).unwrap_or(Self::DEFAULT)
    }

    /// Payload announcing the current watch state to the host.
    #[must_use]
    pub const fn update(&self) -> ThresholdUpdate {
        ThresholdUpdate {
            threshold: self.value,
            enabled: self.enabled,
        }
    }
}

impl Default for SpeedLockThreshold {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

/// Threshold entered by the user, as text from the modal or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdInput {
    Number(f64),
    Text(String),
}

impl ThresholdInput {
    /// Integer value: leading digits of text (an optional sign allowed), or
    /// the truncated number.
    pub fn parse(&self) -> Result<i64, ThresholdError> {
        match self {
            Self::Number(n) if n.is_finite() => {
                #[allow(clippy::cast_possible_truncation)]
                Ok(n.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
            }
            Self::Number(n) => Err(ThresholdError::NotNumeric {
                input: n.to_string(),
            }),
            Self::Text(text) => leading_integer(text).ok_or_else(|| ThresholdError::NotNumeric {
                input: text.clone(),
            }),
        }
    }
}

impl From<&str> for ThresholdInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for ThresholdInput {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Rejected threshold input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThresholdError {
    NotNumeric { input: String },
    OutOfRange { value: i64 },
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNumeric { input } => write!(f, "threshold {input:?} is not a number"),
            Self::OutOfRange { value } => write!(
                f,
                "threshold {value} outside {}..={}",
                SpeedLockThreshold::MIN,
                SpeedLockThreshold::MAX
            ),
        }
    }
}

impl std::error::Error for ThresholdError {}

/// `setSpeedLockThreshold` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub threshold: u32,
    pub enabled: bool,
}

/// Result of a lock toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockChange {
    /// The toggled hold is now active (for full lock: both holds).
    pub locked: bool,
    /// Threshold watch re-armed by this release.
    pub rearm: Option<ThresholdUpdate>,
}

/// Lock flags, snapshots and the threshold watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadarLock {
    state: LockState,
    threshold: SpeedLockThreshold,
}

impl RadarLock {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            state: LockState::default(),
            threshold: SpeedLockThreshold::new(threshold),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &LockState {
        &self.state
    }

    #[must_use]
    pub const fn threshold(&self) -> &SpeedLockThreshold {
        &self.threshold
    }

    pub fn toggle_speed(&mut self, live: &LiveReadings) -> LockChange {
        if self.state.speed_locked {
            self.state.speed_locked = false;
            debug!(target: "radar.lock", "speed hold released");
            LockChange {
                locked: false,
                rearm: self.rearm(),
            }
        } else {
            self.state.speed_locked = true;
            self.state.snapshot_speeds(live);
            debug!(
                target: "radar.lock",
                front = live.front_speed,
                rear = live.rear_speed,
                "speed hold engaged"
            );
            LockChange {
                locked: true,
                rearm: None,
            }
        }
    }

    pub fn toggle_plate(&mut self, live: &LiveReadings) -> LockChange {
        self.state.plate_locked = !self.state.plate_locked;
        if self.state.plate_locked {
            self.state.snapshot_plates(live);
        }
        debug!(target: "radar.lock", locked = self.state.plate_locked, "plate hold toggled");
        LockChange {
            locked: self.state.plate_locked,
            rearm: None,
        }
    }

    /// Neither hold active: engage both with one snapshot. Otherwise release
    /// both, including from a partial lock.
    pub fn toggle_full(&mut self, live: &LiveReadings) -> LockChange {
        if self.state.any() {
            self.state.speed_locked = false;
            self.state.plate_locked = false;
            debug!(target: "radar.lock", "full lock released");
            LockChange {
                locked: false,
                rearm: self.rearm(),
            }
        } else {
            self.state.speed_locked = true;
            self.state.plate_locked = true;
            self.state.snapshot_speeds(live);
            self.state.snapshot_plates(live);
            debug!(target: "radar.lock", "full lock engaged");
            LockChange {
                locked: true,
                rearm: None,
            }
        }
    }

    /// Host reports the threshold was exceeded. Returns whether the watch
    /// was armed (and therefore fired).
    pub fn trigger(&mut self, live: &LiveReadings) -> bool {
        if !self.threshold.enabled {
            debug!(target: "radar.lock", "threshold trigger ignored while disarmed");
            return false;
        }
        if !self.state.speed_locked {
            self.state.speed_locked = true;
            self.state.snapshot_speeds(live);
        }
        if !self.state.plate_locked {
            self.state.plate_locked = true;
            self.state.snapshot_plates(live);
        }
        self.threshold.enabled = false;
        info!(target: "radar.lock", threshold = self.threshold.value, "auto-lock fired");
        true
    }

    /// User sets a new threshold from the modal.
    pub fn set_threshold(&mut self, input: &ThresholdInput) -> Result<ThresholdUpdate, ThresholdError> {
        let value = SpeedLockThreshold::validate(input.parse()?)?;
        self.threshold = SpeedLockThreshold {
            value,
            enabled: true,
            user_disabled: false,
        };
        info!(target: "radar.lock", threshold = value, "threshold set");
        Ok(self.threshold.update())
    }

    /// User switches the watch off.
    pub fn disable_threshold(&mut self) -> ThresholdUpdate {
        self.threshold.enabled = false;
        self.threshold.user_disabled = true;
        info!(target: "radar.lock", "threshold disabled by user");
        self.threshold.update()
    }

    /// Host re-confirms its threshold state. Invalid values keep the current
    /// one; arming is refused after the user disabled the watch.
    pub fn confirm_threshold(&mut self, threshold: i64, enabled: bool) {
        match SpeedLockThreshold::validate(threshold) {
            Ok(value) => self.threshold.value = value,
            Err(error) => debug!(target: "radar.lock", %error, "host threshold ignored"),
        }
        self.threshold.enabled = enabled && !self.threshold.user_disabled;
    }

    /// Clear both holds and every snapshot.
    pub fn unlock_all(&mut self) {
        self.state = LockState::default();
        debug!(target: "radar.lock", "all holds cleared");
    }

    /// Back to power-on state with `threshold` as the watch value.
    pub fn reset(&mut self, threshold: u32) {
        *self = Self::new(threshold);
    }

    fn rearm(&mut self) -> Option<ThresholdUpdate> {
        if self.threshold.user_disabled {
            return None;
        }
        self.threshold.enabled = true;
        debug!(target: "radar.lock", threshold = self.threshold.value, "threshold watch re-armed");
        Some(self.threshold.update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn live() -> LiveReadings {
        LiveReadings {
            front_speed: 72,
            rear_speed: 31,
            front_plate: "ABC123".into(),
            rear_plate: "XYZ789".into(),
            front_plate_index: 1,
            rear_plate_index: 4,
            ..LiveReadings::default()
        }
    }

    #[test]
    fn full_lock_snapshots_everything() {
        let mut lock = RadarLock::default();
        let change = lock.toggle_full(&live());
        assert_eq!(change, LockChange { locked: true, rearm: None });
        assert_eq!(
            lock.state(),
            &LockState {
                speed_locked: true,
                plate_locked: true,
                locked_front_speed: 72,
                locked_rear_speed: 31,
                locked_front_plate: "ABC123".into(),
                locked_rear_plate: "XYZ789".into(),
                locked_front_plate_index: 1,
                locked_rear_plate_index: 4,
            }
        );
    }

    #[test]
    fn partial_lock_then_full_toggle_releases_both() {
        let mut lock = RadarLock::default();
        lock.toggle_plate(&live());
        let change = lock.toggle_full(&live());
        assert!(!change.locked);
        assert!(!lock.state().any());
        assert_eq!(
            change.rearm,
            Some(ThresholdUpdate {
                threshold: 80,
                enabled: true
            })
        );
    }

    #[test]
    fn speed_release_keeps_snapshot_and_rearms() {
        let mut lock = RadarLock::default();
        lock.toggle_speed(&live());
        let mut faster = live();
        faster.front_speed = 99;
        let change = lock.toggle_speed(&faster);
        assert!(!change.locked);
        assert_eq!(lock.state().locked_front_speed, 72);
        assert!(lock.threshold().enabled);
        assert!(change.rearm.is_some());
    }

    #[test]
    fn user_disabled_watch_is_not_rearmed() {
        let mut lock = RadarLock::default();
        lock.disable_threshold();
        lock.toggle_speed(&live());
        let change = lock.toggle_speed(&live());
        assert_eq!(change.rearm, None);
        assert!(!lock.threshold().enabled);
    }

    #[test]
    fn plate_release_does_not_rearm() {
        let mut lock = RadarLock::default();
        lock.toggle_plate(&live());
        assert_eq!(lock.toggle_plate(&live()).rearm, None);
        assert!(!lock.threshold().enabled);
    }

    #[test]
    fn trigger_while_disarmed_changes_nothing() {
        let mut lock = RadarLock::default();
        let before = lock.clone();
        assert!(!lock.trigger(&live()));
        assert_eq!(lock, before);
    }

    #[test]
    fn trigger_keeps_existing_snapshot_and_disarms() {
        let mut lock = RadarLock::default();
        lock.set_threshold(&"60".into()).expect("valid");
        lock.toggle_speed(&live());
        let mut later = live();
        later.front_speed = 90;
        later.front_plate = "NEW1".into();
        assert!(lock.trigger(&later));
        assert!(lock.state().is_full());
        assert_eq!(lock.state().locked_front_speed, 72);
        assert_eq!(lock.state().locked_front_plate, "NEW1");
        assert!(!lock.threshold().enabled);
    }

    #[test]
    fn threshold_validation() {
        let mut lock = RadarLock::default();
        for bad in [ThresholdInput::from(0), 201.into(), "abc".into(), "".into()] {
            assert!(lock.set_threshold(&bad).is_err(), "{bad:?}");
        }
        assert_eq!(lock.threshold(), &SpeedLockThreshold::default());

        let update = lock.set_threshold(&" 120 mph".into()).expect("leading digits");
        assert_eq!(
            update,
            ThresholdUpdate {
                threshold: 120,
                enabled: true
            }
        );
    }

    #[test]
    fn set_threshold_clears_user_disabled() {
        let mut lock = RadarLock::default();
        lock.disable_threshold();
        lock.set_threshold(&ThresholdInput::Number(65.0)).expect("valid");
        assert!(!lock.threshold().user_disabled);
        assert!(lock.threshold().enabled);
    }

    #[test]
    fn host_confirmation_respects_user_disable() {
        let mut lock = RadarLock::default();
        lock.confirm_threshold(95, true);
        assert_eq!(lock.threshold().value, 95);
        assert!(lock.threshold().enabled);

        lock.disable_threshold();
        lock.confirm_threshold(500, true);
        assert_eq!(lock.threshold().value, 95);
        assert!(!lock.threshold().enabled);
    }

    #[test]
    fn step_clamps_to_range() {
        assert_eq!(SpeedLockThreshold::step(&"198".into(), 5), 200);
        assert_eq!(SpeedLockThreshold::step(&"".into(), -5), 1);
        assert_eq!(SpeedLockThreshold::step(&"80".into(), SpeedLockThreshold::STEP), 85);
    }

    #[test]
    fn unlock_all_clears_snapshots() {
        let mut lock = RadarLock::default();
        lock.toggle_full(&live());
        lock.unlock_all();
        assert_eq!(lock.state(), &LockState::default());
    }
}
