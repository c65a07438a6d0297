#![forbid(unsafe_code)]

//! Core: panel geometry, gesture sessions, lock/BOLO state machines, and the
//! reading log for the radar overlay.
//!
//! # Role in the overlay
//! `radar-core` is pure state. It owns no I/O: every mutation is a named
//! action on [`RadarStore`] that returns the [`Effect`]s it produced, and
//! `radar-bridge` decides whether those become host calls or banners.
//!
//! # Primary responsibilities
//! - **Geometry**: clamp, drag and multi-edge resize math ([`geometry`]).
//! - **Panels**: anchored placements, the `px` wire format and default layout ([`panel`]).
//! - **Interaction**: one active drag/resize gesture with coalesced moves ([`interaction`]).
//! - **Locks**: full/speed/plate holds and the threshold watch ([`lock`]).
//! - **BOLO**: watchlist plus per-direction match-onset alerts ([`bolo`]).
//! - **Reading log**: newest-first saved snapshots ([`reading_log`]).

pub mod bolo;
pub mod coalescer;
pub mod effect;
pub mod geometry;
pub mod interaction;
pub mod lock;
pub mod panel;
pub mod reading_log;
pub mod readings;
pub mod store;

pub use effect::{Effect, HostRequest};
pub use geometry::{Point, Rect, ResizeEdges, SizeBounds, Viewport};
pub use panel::{PanelId, PanelPosition};
pub use readings::{Direction, LiveReadings, PartialUpdate};
pub use store::{RadarStore, StoreOptions};
