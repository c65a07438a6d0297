#![forbid(unsafe_code)]

//! Local notification banners and the clocks that drive them.
//!
//! In `native` notification mode a notice becomes a banner that stays up for
//! a fixed duration. A newer notice replaces the current one and restarts
//! the timer. Time is injected through [`DeterministicClock`] so expiry is
//! reproducible under test and in the replay harness.

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

/// Default banner lifetime.
pub const DEFAULT_BANNER_DURATION: Duration = Duration::from_millis(3000);

/// Format used for saved-reading timestamps: `14:03:09 02/27/2026`.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S %m/%d/%Y";

/// Host-driven monotonic clock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// A visible banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub message: String,
    /// Bumped on every show so a renderer can restart its fade animation.
    pub key: u64,
    #[serde(skip)]
    pub shown_at: Duration,
}

/// Holds at most one banner.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    duration: Duration,
    current: Option<Banner>,
    next_key: u64,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER_DURATION)
    }
}

impl NotificationCenter {
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
            next_key: 0,
        }
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Show `message`, replacing whatever is up.
    pub fn show(&mut self, message: impl Into<String>, now: Duration) -> &Banner {
        self.next_key += 1;
        self.current.insert(Banner {
            message: message.into(),
            key: self.next_key,
            shown_at: now,
        })
    }

    /// Banner visible at `now`, if any.
    #[must_use]
    pub fn current(&self, now: Duration) -> Option<&Banner> {
        self.current
            .as_ref()
            .filter(|banner| now.saturating_sub(banner.shown_at) < self.duration)
    }

    /// Drop an expired banner. Returns `true` if one was removed.
    pub fn expire(&mut self, now: Duration) -> bool {
        if self.current.is_some() && self.current(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }
}

/// Render a reading timestamp.
#[must_use]
pub fn timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Wall-clock timestamp in the local zone.
#[must_use]
pub fn local_timestamp() -> String {
    timestamp(&Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn banner_expires_after_duration() {
        let mut center = NotificationCenter::default();
        center.show("Radar locked", ms(100));
        assert_eq!(
            center.current(ms(3099)).map(|b| b.message.as_str()),
            Some("Radar locked")
        );
        assert!(center.current(ms(3100)).is_none());
        assert!(!center.expire(ms(3000)));
        assert!(center.expire(ms(3100)));
        assert!(!center.expire(ms(3100)));
    }

    #[test]
    fn newer_notice_replaces_and_restarts() {
        let mut center = NotificationCenter::new(ms(1000));
        let first = center.show("Log opened", ms(0)).key;
        let second = center.show("Log closed", ms(900)).key;
        assert!(second > first);
        let banner = center.current(ms(1500)).expect("restarted timer");
        assert_eq!(banner.message, "Log closed");
    }

    #[test]
    fn clock_advances_and_saturates() {
        let mut clock = DeterministicClock::new();
        clock.advance(ms(250));
        clock.advance(ms(250));
        assert_eq!(clock.now(), ms(500));
        clock.advance(Duration::MAX);
        clock.advance(ms(1));
        assert_eq!(clock.now(), Duration::MAX);
    }

    #[test]
    fn timestamp_format() {
        let at = NaiveDate::from_ymd_opt(2026, 2, 7)
            .and_then(|d| d.and_hms_opt(9, 5, 3))
            .expect("valid date")
            .and_utc();
        assert_eq!(timestamp(&at), "09:05:03 02/07/2026");
    }
}
