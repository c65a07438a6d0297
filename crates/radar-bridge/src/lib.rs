#![forbid(unsafe_code)]

//! Host bridge for the radar overlay.
//!
//! The host (game client) talks to the overlay over a one-way JSON message
//! channel and receives user actions back as fire-and-forget calls. This
//! crate is that boundary:
//!
//! - [`message`] decodes inbound `{"type": ...}` messages.
//! - [`sink`] defines [`HostSink`], the single outbound seam, with recording
//!   and queued implementations.
//! - `http_sink` (feature `http`) POSTs calls from a worker thread.
//! - [`notification`] holds the local banner and the injected clock.
//! - [`config`] loads [`BridgeConfig`] from TOML or JSON.
//! - [`bridge`] wires all of it around a [`radar_core::RadarStore`].

pub mod bridge;
pub mod config;
#[cfg(feature = "http")]
pub mod http_sink;
pub mod message;
pub mod notification;
pub mod sink;

pub use bridge::{HostBridge, UiAction};
pub use config::{BridgeConfig, ConfigError};
#[cfg(feature = "http")]
pub use http_sink::HttpHostSink;
pub use message::{InboundMessage, MessageError, parse_inbound};
pub use notification::{Banner, DeterministicClock, NotificationCenter};
pub use sink::{HostSink, NullSink, OutboundCall, QueuedSink, RecordingSink};
