#![forbid(unsafe_code)]

//! Outbound host calls.
//!
//! [`HostSink`] is the single seam between the overlay and the host. Calls are
//! fire-and-forget: a sink never reports failure back to the caller.

use std::collections::VecDeque;

use radar_core::HostRequest;
use serde::Serialize;
use serde_json::Value;

/// Destination for outbound host calls.
pub trait HostSink {
    fn send(&mut self, request: HostRequest);
}

impl<S: HostSink + ?Sized> HostSink for &mut S {
    fn send(&mut self, request: HostRequest) {
        (**self).send(request);
    }
}

impl<S: HostSink + ?Sized> HostSink for Box<S> {
    fn send(&mut self, request: HostRequest) {
        (**self).send(request);
    }
}

/// Endpoint plus JSON body, the shape a host actually receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundCall {
    pub endpoint: &'static str,
    pub body: Value,
}

impl From<&HostRequest> for OutboundCall {
    fn from(request: &HostRequest) -> Self {
        Self {
            endpoint: request.endpoint(),
            body: request.body(),
        }
    }
}

/// Keeps every request; the test double.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    requests: Vec<HostRequest>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn requests(&self) -> &[HostRequest] {
        &self.requests
    }

    /// Endpoint names in send order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&'static str> {
        self.requests.iter().map(HostRequest::endpoint).collect()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }
}

impl HostSink for RecordingSink {
    fn send(&mut self, request: HostRequest) {
        self.requests.push(request);
    }
}

/// Host-driven queue for embedding.
///
/// The embedding environment drains pending calls and performs them itself.
#[derive(Debug, Clone, Default)]
pub struct QueuedSink {
    queue: VecDeque<OutboundCall>,
}

impl QueuedSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain all pending calls.
    pub fn drain(&mut self) -> impl Iterator<Item = OutboundCall> + '_ {
        self.queue.drain(..)
    }
}

impl HostSink for QueuedSink {
    fn send(&mut self, request: HostRequest) {
        self.queue.push_back(OutboundCall::from(&request));
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl HostSink for NullSink {
    fn send(&mut self, request: HostRequest) {
        tracing::trace!(target: "radar.sink", endpoint = request.endpoint(), "dropped by null sink");
    }
}
