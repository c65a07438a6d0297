#![forbid(unsafe_code)]

//! BOLO (be-on-the-lookout) watchlist and match-onset detection.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::readings::Direction;

/// Plate text the host shows when a camera has nothing in view.
pub const PLATE_PLACEHOLDER: &str = "--------";

/// Trim and uppercase.
#[must_use]
pub fn normalize_plate(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalized plates that can never match.
fn is_matchable(normalized: &str) -> bool {
    !normalized.is_empty() && normalized != PLATE_PLACEHOLDER
}

/// Rejected watchlist input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoloInputError {
    Empty,
}

impl fmt::Display for BoloInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("plate is empty after normalization"),
        }
    }
}

impl std::error::Error for BoloInputError {}

/// Outcome of [`BoloWatchlist::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoloAdd {
    Added(String),
    Duplicate(String),
}

/// Ordered set of normalized plates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BoloWatchlist {
    plates: Vec<String>,
}

impl BoloWatchlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn plates(&self) -> &[String] {
        &self.plates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    /// Membership of an already normalized plate.
    #[must_use]
    pub fn contains(&self, normalized: &str) -> bool {
        self.plates.iter().any(|plate| plate == normalized)
    }

    pub fn add(&mut self, raw: &str) -> Result<BoloAdd, BoloInputError> {
        let plate = normalize_plate(raw);
        if plate.is_empty() {
            return Err(BoloInputError::Empty);
        }
        if self.contains(&plate) {
            debug!(target: "radar.bolo", %plate, "plate already watched");
            return Ok(BoloAdd::Duplicate(plate));
        }
        info!(target: "radar.bolo", %plate, "plate added to watchlist");
        self.plates.push(plate.clone());
        Ok(BoloAdd::Added(plate))
    }

    /// Remove by normalized text; returns the removed plate.
    pub fn remove(&mut self, raw: &str) -> Option<String> {
        let plate = normalize_plate(raw);
        let index = self.plates.iter().position(|p| *p == plate)?;
        info!(target: "radar.bolo", %plate, "plate removed from watchlist");
        Some(self.plates.remove(index))
    }

    /// Replace the whole list, normalizing and dropping blanks and duplicates.
    pub fn replace_all<I, S>(&mut self, plates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.plates.clear();
        for raw in plates {
            let plate = normalize_plate(raw.as_ref());
            if !plate.is_empty() && !self.contains(&plate) {
                self.plates.push(plate);
            }
        }
        debug!(target: "radar.bolo", count = self.plates.len(), "watchlist replaced");
    }

    pub fn clear(&mut self) {
        self.plates.clear();
    }
}

/// `boloAlert` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoloAlert {
    pub plate: String,
    pub direction: Direction,
}

/// Per-direction match flags; alerts fire on false→true edges only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoloMatcher {
    front: bool,
    rear: bool,
}

impl BoloMatcher {
    #[must_use]
    pub const fn is_match(&self, direction: Direction) -> bool {
        match direction {
            Direction::Front => self.front,
            Direction::Rear => self.rear,
        }
    }

    /// Recompute both flags against the displayed plates.
    pub fn evaluate(&mut self, watchlist: &BoloWatchlist, front: &str, rear: &str) -> Vec<BoloAlert> {
        let mut alerts = Vec::new();
        for (direction, displayed) in [(Direction::Front, front), (Direction::Rear, rear)] {
            let plate = normalize_plate(displayed);
            let matched = is_matchable(&plate) && watchlist.contains(&plate);
            let flag = match direction {
                Direction::Front => &mut self.front,
                Direction::Rear => &mut self.rear,
            };
            if matched && !*flag {
                info!(target: "radar.bolo", %plate, %direction, "BOLO match");
                alerts.push(BoloAlert { plate, direction });
            }
            *flag = matched;
        }
        alerts
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn watchlist(plates: &[&str]) -> BoloWatchlist {
        let mut list = BoloWatchlist::new();
        list.replace_all(plates);
        list
    }

    #[test]
    fn add_normalizes_and_rejects_duplicates() {
        let mut list = BoloWatchlist::new();
        assert_eq!(list.add(" abc123 "), Ok(BoloAdd::Added("ABC123".into())));
        assert_eq!(list.add("ABC123"), Ok(BoloAdd::Duplicate("ABC123".into())));
        assert_eq!(list.add("   "), Err(BoloInputError::Empty));
        assert_eq!(list.plates(), ["ABC123".to_string()]);
    }

    #[test]
    fn remove_normalizes_and_ignores_absent() {
        let mut list = watchlist(&["ABC123", "XYZ789"]);
        assert_eq!(list.remove("xyz789"), Some("XYZ789".into()));
        assert_eq!(list.remove("nope"), None);
        assert_eq!(list.plates(), ["ABC123".to_string()]);
    }

    #[test]
    fn replace_all_dedupes_in_order() {
        let list = watchlist(&["b2", "a1", "B2 ", ""]);
        assert_eq!(list.plates(), ["B2".to_string(), "A1".to_string()]);
    }

    #[test]
    fn alert_fires_once_per_onset() {
        let list = watchlist(&["ABC123"]);
        let mut matcher = BoloMatcher::default();
        let alerts = matcher.evaluate(&list, "abc123", "");
        assert_eq!(
            alerts,
            vec![BoloAlert {
                plate: "ABC123".into(),
                direction: Direction::Front
            }]
        );
        assert!(matcher.evaluate(&list, "abc123", "").is_empty());
        assert!(matcher.evaluate(&list, "OTHER", "").is_empty());
        assert!(!matcher.is_match(Direction::Front));
        assert_eq!(matcher.evaluate(&list, "ABC123", "").len(), 1);
    }

    #[test]
    fn both_directions_alert_independently() {
        let list = watchlist(&["ABC123"]);
        let mut matcher = BoloMatcher::default();
        let alerts = matcher.evaluate(&list, "ABC123", "ABC123");
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1].direction, Direction::Rear);
    }

    #[test]
    fn placeholder_never_matches() {
        let list = watchlist(&[PLATE_PLACEHOLDER]);
        let mut matcher = BoloMatcher::default();
        assert!(matcher.evaluate(&list, PLATE_PLACEHOLDER, "").is_empty());
    }
}
