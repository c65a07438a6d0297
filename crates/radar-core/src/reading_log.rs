#![forbid(unsafe_code)]

//! Manually saved radar readings, newest first.

use serde::Serialize;
use tracing::debug;

use crate::lock::LockState;
use crate::readings::LiveReadings;

/// Values captured when the user saves a reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSnapshot {
    pub timestamp: String,
    pub front_speed: u32,
    pub rear_speed: u32,
    pub locked_front_speed: u32,
    pub locked_rear_speed: u32,
    pub front_plate: String,
    pub rear_plate: String,
    pub locked_front_plate: String,
    pub locked_rear_plate: String,
}

impl ReadingSnapshot {
    #[must_use]
    pub fn capture(timestamp: impl Into<String>, live: &LiveReadings, lock: &LockState) -> Self {
        Self {
            timestamp: timestamp.into(),
            front_speed: live.front_speed,
            rear_speed: live.rear_speed,
            locked_front_speed: lock.locked_front_speed,
            locked_rear_speed: lock.locked_rear_speed,
            front_plate: live.front_plate.clone(),
            rear_plate: live.rear_plate.clone(),
            locked_front_plate: lock.locked_front_plate.clone(),
            locked_rear_plate: lock.locked_rear_plate.clone(),
        }
    }
}

/// A logged snapshot with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReading {
    pub id: u64,
    #[serde(flatten)]
    pub snapshot: ReadingSnapshot,
}

/// Append/remove ledger. Ids come from a counter that starts at 1 and is
/// never rewound, not even by [`ReadingLog::clear`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingLog {
    readings: Vec<SavedReading>,
    next_id: u64,
}

impl Default for ReadingLog {
    fn default() -> Self {
        Self {
            readings: Vec::new(),
            next_id: 1,
        }
    }
}

impl ReadingLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first.
    #[must_use]
    pub fn readings(&self) -> &[SavedReading] {
        &self.readings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&SavedReading> {
        self.readings.iter().find(|reading| reading.id == id)
    }

    /// Prepend `snapshot`; returns its id.
    pub fn add(&mut self, snapshot: ReadingSnapshot) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.readings.insert(0, SavedReading { id, snapshot });
        debug!(target: "radar.log", id, count = self.readings.len(), "reading saved");
        id
    }

    /// Returns whether a reading was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.readings.len();
        self.readings.retain(|reading| reading.id != id);
        let removed = self.readings.len() != before;
        debug!(target: "radar.log", id, removed, "reading removal");
        removed
    }

    /// Drop every reading; the id counter keeps running.
    pub fn clear(&mut self) {
        self.readings.clear();
    }
}
