// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local Channel: correlated request/response over a persistent WebSocket.
//!
//! Every request carries a fresh `requestId`. Responses are matched back to
//! their caller by that id, in whatever order the backend answers. Frames
//! without an id are broadcasts and go to the [`EventBus`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use tm_core::{Envelope, LocalFrame, LocalRequest};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{SyncError, SyncResult};
use super::events::{EventBus, EventStream};
use super::socket::{ChannelState, FrameHandler, Link, LinkConfig, SharedChannelState};

/// Default local backend endpoint.
pub const DEFAULT_LOCAL_URL: &str = "ws://127.0.0.1:8766";
/// Default time a caller waits for a correlated response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default pause between a drop and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Settings for a [`LocalChannel`].
#[derive(Debug, Clone)]
pub struct LocalChannelConfig {
    pub url: String,
    pub request_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl Default for LocalChannelConfig {
    fn default() -> Self {
        LocalChannelConfig {
            url: DEFAULT_LOCAL_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

struct PendingRequest {
    issued_at: Instant,
    completion: oneshot::Sender<SyncResult<Envelope>>,
}

/// Requests awaiting a response, keyed by request id.
///
/// Entries leave the table when completed, when their caller times out, or
/// when a later registration finds them older than the timeout.
#[derive(Default)]
pub(crate) struct PendingRequests {
    entries: Mutex<HashMap<String, PendingRequest>>,
}

impl PendingRequests {
    pub(crate) fn register(
        &self,
        request_id: &str,
        ttl: Duration,
    ) -> oneshot::Receiver<SyncResult<Envelope>> {
        let (tx, rx) = oneshot::channel();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, p| p.issued_at.elapsed() < ttl);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "purged expired pending requests");
        }
        entries.insert(
            request_id.to_string(),
            PendingRequest {
                issued_at: Instant::now(),
                completion: tx,
            },
        );
        rx
    }

    /// Resolves a waiter. Returns false when no caller is waiting on `request_id`.
    pub(crate) fn complete(&self, request_id: &str, result: SyncResult<Envelope>) -> bool {
        let entry = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(request_id);
        match entry {
            // The caller may have given up in the meantime
            Some(pending) => pending.completion.send(result).is_ok(),
            None => false,
        }
    }

    pub(crate) fn cancel(&self, request_id: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(request_id);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Routes incoming local frames to waiters or subscribers.
#[derive(Default)]
pub(crate) struct LocalDispatcher {
    pub(crate) pending: PendingRequests,
    pub(crate) events: EventBus,
}

impl FrameHandler for LocalDispatcher {
    fn on_frame(&self, text: &str) {
        match LocalFrame::parse(text) {
            Ok(LocalFrame::Response { request_id, result }) => {
                let result = result.map_err(SyncError::Protocol);
                if !self.pending.complete(&request_id, result) {
                    debug!(request_id = %request_id, "discarding response with no waiter");
                }
            }
            Ok(LocalFrame::Broadcast(event)) => self.events.publish(event),
            Ok(LocalFrame::Unroutable) => {
                debug!("dropping local frame with neither requestId nor event");
            }
            Err(e) => warn!(error = %e, "dropping malformed local frame"),
        }
    }
}

/// Persistent connection to the local backend.
pub struct LocalChannel {
    link: Arc<Link>,
    dispatcher: Arc<LocalDispatcher>,
    request_timeout: Duration,
}

impl LocalChannel {
    pub fn new(config: LocalChannelConfig) -> Self {
        let link = Link::new(LinkConfig {
            name: "local",
            url: config.url,
            reconnect_delay: config.reconnect_delay,
        });
        LocalChannel {
            link: Arc::new(link),
            dispatcher: Arc::new(LocalDispatcher::default()),
            request_timeout: config.request_timeout,
        }
    }

    /// Starts the connection supervisor. Idempotent.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        if self.link.start(Arc::clone(&self.dispatcher)).is_some() {
            debug!(url = %self.link.url(), "local channel started");
        }
    }

    /// Stops reconnecting and closes the socket.
    pub fn close(&self) {
        self.link.close();
    }

    pub fn state(&self) -> ChannelState {
        self.link.state().get()
    }

    pub fn state_handle(&self) -> &SharedChannelState {
        self.link.state()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Sends a correlated request and waits for its envelope.
    ///
    /// Fails with [`SyncError::NotConnected`] without sending when the
    /// channel is down, and with [`SyncError::Timeout`] when no response
    /// arrives in time. A response arriving after the timeout is discarded.
    pub async fn request(&self, action: &str, payload: Value) -> SyncResult<Envelope> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let request_id = Uuid::new_v4().to_string();
        let frame = LocalRequest::new(action, request_id.as_str(), payload).to_json()?;
        let rx = self
            .dispatcher
            .pending
            .register(&request_id, self.request_timeout);

        if let Err(e) = self.link.send_text(frame) {
            self.dispatcher.pending.cancel(&request_id);
            return Err(e);
        }
        debug!(action, request_id = %request_id, "local request sent");

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            // Sender dropped: the entry was purged as expired
            Ok(Err(_)) | Err(_) => {
                self.dispatcher.pending.cancel(&request_id);
                warn!(action, request_id = %request_id, "local request timed out");
                Err(SyncError::Timeout {
                    action: action.to_string(),
                    after: self.request_timeout,
                })
            }
        }
    }

    /// Sends a message that expects no response.
    pub fn emit(&self, action: &str, payload: Value) -> SyncResult<()> {
        let frame = LocalRequest::emit(action, payload).to_json()?;
        self.link.send_text(frame)
    }

    /// Subscribes to a broadcast event by name.
    pub fn on_event(&self, name: impl Into<String>) -> EventStream {
        self.dispatcher.events.subscribe(name)
    }

    /// Number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.dispatcher.pending.len()
    }
}

impl Drop for LocalChannel {
    fn drop(&mut self) {
        self.link.close();
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
