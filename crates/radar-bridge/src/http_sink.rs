#![forbid(unsafe_code)]

//! HTTP sink: POSTs outbound calls to `https://{resource}/{endpoint}` from a
//! dedicated worker thread.
//!
//! [`HostSink::send`] only enqueues; it never blocks on I/O. The queue is
//! bounded, and calls that do not fit are dropped. Transport failures are
//! logged at `debug` and swallowed, matching the host's fire-and-forget
//! contract. Shutdown waits for at most the one request in flight; queued
//! calls that have not started are discarded.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use radar_core::HostRequest;
use tracing::{debug, warn};

use crate::sink::{HostSink, OutboundCall};

/// Per-request timeout on the worker.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpHostSink {
    sender: Option<mpsc::SyncSender<OutboundCall>>,
    stopping: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    resource: String,
}

impl HttpHostSink {
    /// Spawn the worker for `resource` with room for `capacity` pending calls.
    pub fn start(resource: impl Into<String>, capacity: usize) -> io::Result<Self> {
        let resource = resource.into();
        let (tx, rx) = mpsc::sync_channel::<OutboundCall>(capacity.max(1));
        let base = format!("https://{resource}");
        let stopping = Arc::new(AtomicBool::new(false));

        let worker_stopping = Arc::clone(&stopping);
        let handle = thread::Builder::new()
            .name("radar-http-sink".into())
            .spawn(move || worker_loop(&base, &rx, &worker_stopping))?;

        Ok(Self {
            sender: Some(tx),
            stopping,
            handle: Some(handle),
            resource,
        })
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Stop the worker. Calls still queued are discarded.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.stopping.store(true, Ordering::Release);
        // Disconnecting lets the worker's recv end once the queue is skipped.
        self.sender = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl HostSink for HttpHostSink {
    fn send(&mut self, request: HostRequest) {
        let call = OutboundCall::from(&request);
        let endpoint = call.endpoint;
        let Some(sender) = self.sender.as_ref() else {
            debug!(target: "radar.sink", endpoint, "http sink stopped; call dropped");
            return;
        };
        match sender.try_send(call) {
            Ok(()) => {}
            Err(mpsc::TrySendError::Full(_)) => {
                debug!(target: "radar.sink", endpoint, "http queue full; call dropped");
            }
            Err(mpsc::TrySendError::Disconnected(_)) => {
                debug!(target: "radar.sink", endpoint, "http worker gone; call dropped");
            }
        }
    }
}

impl Drop for HttpHostSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(base: &str, rx: &mpsc::Receiver<OutboundCall>, stopping: &AtomicBool) {
    let client = match reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
    {
        Ok(client) => Some(client),
        Err(error) => {
            warn!(target: "radar.sink", %error, "http client unavailable; outbound calls will be dropped");
            None
        }
    };

    let mut skipped = 0usize;
    while let Ok(call) = rx.recv() {
        if stopping.load(Ordering::Acquire) {
            skipped += 1;
            continue;
        }
        let Some(client) = client.as_ref() else {
            continue;
        };
        let url = format!("{base}/{}", call.endpoint);
        match client.post(&url).json(&call.body).send() {
            Ok(response) => {
                debug!(
                    target: "radar.sink",
                    endpoint = call.endpoint,
                    status = response.status().as_u16(),
                    "host call delivered"
                );
            }
            Err(error) => {
                debug!(target: "radar.sink", endpoint = call.endpoint, %error, "host call failed");
            }
        }
    }
    if skipped > 0 {
        debug!(target: "radar.sink", skipped, "queued host calls discarded on shutdown");
    }
}
