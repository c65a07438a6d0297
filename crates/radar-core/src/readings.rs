#![forbid(unsafe_code)]

//! Live radar readings and the partial updates the host streams in.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Antenna direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(alias = "Front")]
    Front,
    #[serde(alias = "Rear")]
    Rear,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Rear => "rear",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the antennas currently see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveReadings {
    pub front_speed: u32,
    pub rear_speed: u32,
    pub patrol_speed: u32,
    pub front_plate: String,
    pub rear_plate: String,
    pub front_plate_index: u32,
    pub rear_plate_index: u32,
    pub front_approaching: bool,
    pub rear_approaching: bool,
}

impl LiveReadings {
    #[must_use]
    pub fn speed(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Front => self.front_speed,
            Direction::Rear => self.rear_speed,
        }
    }

    #[must_use]
    pub fn plate(&self, direction: Direction) -> &str {
        match direction {
            Direction::Front => &self.front_plate,
            Direction::Rear => &self.rear_plate,
        }
    }

    /// Overlay every present field of `update`. Returns whether a plate
    /// changed.
    pub fn apply(&mut self, update: &PartialUpdate) -> bool {
        fn set<T: Clone + PartialEq>(slot: &mut T, value: Option<&T>) -> bool {
            match value {
                Some(value) if *slot != *value => {
                    *slot = value.clone();
                    true
                }
                _ => false,
            }
        }

        set(&mut self.front_speed, update.front_speed.as_ref());
        set(&mut self.rear_speed, update.rear_speed.as_ref());
        set(&mut self.patrol_speed, update.patrol_speed.as_ref());
        set(&mut self.front_plate_index, update.front_plate_index.as_ref());
        set(&mut self.rear_plate_index, update.rear_plate_index.as_ref());
        set(&mut self.front_approaching, update.front_approaching.as_ref());
        set(&mut self.rear_approaching, update.rear_approaching.as_ref());
        let front = set(&mut self.front_plate, update.front_plate.as_ref());
        let rear = set(&mut self.rear_plate, update.rear_plate.as_ref());
        front || rear
    }

    /// Replace one camera's plate (and index, when given).
    pub fn set_plate(&mut self, direction: Direction, plate: &str, index: Option<u32>) {
        let (slot, index_slot) = match direction {
            Direction::Front => (&mut self.front_plate, &mut self.front_plate_index),
            Direction::Rear => (&mut self.rear_plate, &mut self.rear_plate_index),
        };
        plate.clone_into(slot);
        if let Some(index) = index {
            *index_slot = index;
        }
    }
}

/// Host `update` payload. Absent fields mean "no change".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialUpdate {
    #[serde(deserialize_with = "lenient_count")]
    pub front_speed: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub rear_speed: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub patrol_speed: Option<u32>,
    pub front_plate: Option<String>,
    pub rear_plate: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub front_plate_index: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub rear_plate_index: Option<u32>,
    pub front_approaching: Option<bool>,
    pub rear_approaching: Option<bool>,
}

/// Accept any JSON number (or null) and round it to a non-negative count.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.and_then(round_count))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_count(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}
