// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud Channel: event-based request/response against the shared backend.
//!
//! The cloud protocol has no correlation ids. A request emits one event and
//! waits for either the matching success or failure event; concurrent
//! requests for the same operation are answered oldest first. Whenever the
//! cloud cannot answer (failure event, `connect_error`, disconnect, timeout)
//! the same operation is retried once through the Command Executor.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tm_core::protocol::CONNECT_ERROR_EVENT;
use tm_core::{
    BroadcastEvent, CloudEvents, CloudFrame, EntityHeader, EntityKind, Envelope, OpArgs, OpKind,
};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::error::{SyncError, SyncResult};
use super::events::{EventBus, EventStream};
use super::executor::CommandExecutor;
use super::local::{DEFAULT_RECONNECT_DELAY, DEFAULT_REQUEST_TIMEOUT};
use super::socket::{ChannelState, FrameHandler, Link, LinkConfig, SharedChannelState};

/// Settings for a [`CloudChannel`].
#[derive(Debug, Clone)]
pub struct CloudChannelConfig {
    pub url: String,
    pub request_timeout: Duration,
    pub reconnect_delay: Duration,
    /// Caller identity used to decide which fetched records to join rooms for.
    pub user_id: Option<String>,
}

impl CloudChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        CloudChannelConfig {
            url: url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            user_id: None,
        }
    }
}

#[derive(Debug)]
enum CloudReply {
    Success(Value),
    Failed(String),
}

struct Waiter {
    id: u64,
    success: String,
    failure: String,
    completion: oneshot::Sender<CloudReply>,
}

/// Routes incoming cloud frames to waiters and subscribers.
#[derive(Default)]
struct CloudDispatcher {
    waiters: Mutex<Vec<Waiter>>,
    next_id: AtomicU64,
    rooms: Mutex<HashSet<(EntityKind, String)>>,
    events: EventBus,
}

impl CloudDispatcher {
    fn register(&self, events: &CloudEvents) -> (u64, oneshot::Receiver<CloudReply>) {
        let (tx, rx) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.waiters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Waiter {
                id,
                success: events.success.clone(),
                failure: events.failure.clone(),
                completion: tx,
            });
        (id, rx)
    }

    fn cancel(&self, id: u64) {
        self.waiters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|w| w.id != id);
    }

    /// Fails every outstanding waiter so its caller falls back at once.
    fn fail_all(&self, reason: &str) {
        let waiters = std::mem::take(&mut *self.waiters.lock().unwrap_or_else(|e| e.into_inner()));
        if !waiters.is_empty() {
            debug!(count = waiters.len(), reason, "failing cloud waiters");
        }
        for waiter in waiters {
            let _ = waiter.completion.send(CloudReply::Failed(reason.to_string()));
        }
    }

    /// Removes and returns the oldest waiter listening for `event`.
    fn take_waiter(&self, event: &str) -> Option<Waiter> {
        let mut waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
        let index = waiters
            .iter()
            .position(|w| w.success == event || w.failure == event)?;
        Some(waiters.remove(index))
    }

    fn pending(&self) -> usize {
        self.waiters.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl FrameHandler for CloudDispatcher {
    fn on_frame(&self, text: &str) {
        let frame = match CloudFrame::from_json(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed cloud frame");
                return;
            }
        };

        if frame.event == CONNECT_ERROR_EVENT {
            warn!(data = %frame.data, "cloud backend reported connect_error");
            self.fail_all(&failure_reason(&frame.event, &frame.data));
            return;
        }

        self.events
            .publish(BroadcastEvent::new(frame.event.clone(), frame.data.clone()));

        if let Some(waiter) = self.take_waiter(&frame.event) {
            let reply = if frame.event == waiter.success {
                CloudReply::Success(frame.data)
            } else {
                CloudReply::Failed(failure_reason(&frame.event, &frame.data))
            };
            let _ = waiter.completion.send(reply);
        }
    }

    fn on_disconnected(&self) {
        self.fail_all("cloud channel disconnected");
        // The server forgets room membership with the socket
        self.rooms.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

fn failure_reason(event: &str, data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| event.to_string()),
        _ => event.to_string(),
    }
}

/// Persistent connection to the cloud backend with executor fallback.
pub struct CloudChannel {
    link: Arc<Link>,
    dispatcher: Arc<CloudDispatcher>,
    executor: Arc<dyn CommandExecutor>,
    request_timeout: Duration,
    user_id: Option<String>,
}

impl CloudChannel {
    pub fn new(config: CloudChannelConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let link = Link::new(LinkConfig {
            name: "cloud",
            url: config.url,
            reconnect_delay: config.reconnect_delay,
        });
        CloudChannel {
            link: Arc::new(link),
            dispatcher: Arc::new(CloudDispatcher::default()),
            executor,
            request_timeout: config.request_timeout,
            user_id: config.user_id,
        }
    }

    /// Starts the connection supervisor. Idempotent.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        if self.link.start(Arc::clone(&self.dispatcher)).is_some() {
            debug!(url = %self.link.url(), "cloud channel started");
        }
    }

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

    pub async fn get_all(&self, entity: EntityKind, args: OpArgs) -> SyncResult<Envelope> {
        self.execute(entity, OpKind::GetAll, args).await
    }

    pub async fn get_by_field(&self, entity: EntityKind, args: OpArgs) -> SyncResult<Envelope> {
        self.execute(entity, OpKind::Get, args).await
    }

    pub async fn create(&self, entity: EntityKind, args: OpArgs) -> SyncResult<Envelope> {
        self.execute(entity, OpKind::Create, args).await
    }

    pub async fn update(&self, entity: EntityKind, args: OpArgs) -> SyncResult<Envelope> {
        self.execute(entity, OpKind::Update, args).await
    }

    pub async fn delete(&self, entity: EntityKind, args: OpArgs) -> SyncResult<Envelope> {
        self.execute(entity, OpKind::Delete, args).await
    }

    /// Runs one operation against the cloud, falling back to the executor.
    ///
    /// A cloud success payload is raw record data and is wrapped in a
    /// success envelope.
    pub async fn execute(
        &self,
        entity: EntityKind,
        op: OpKind,
        args: OpArgs,
    ) -> SyncResult<Envelope> {
        let Some(events) = op.cloud_events(entity) else {
            return self.fallback(entity, op, &args, "operation has no cloud events").await;
        };
        if !self.is_connected() {
            return self.fallback(entity, op, &args, "cloud channel disconnected").await;
        }

        let mut payload = args.to_value();
        if op == OpKind::Get {
            if let (Some(obj), Some(id)) = (payload.as_object_mut(), args.id.as_ref()) {
                obj.insert("field".to_string(), Value::String("id".to_string()));
                obj.insert("value".to_string(), Value::String(id.clone()));
            }
        }
        let frame = CloudFrame::new(events.request.as_str(), payload).to_json()?;

        let (waiter_id, rx) = self.dispatcher.register(&events);
        if let Err(e) = self.link.send_text(frame) {
            self.dispatcher.cancel(waiter_id);
            return self.fallback(entity, op, &args, &e.to_string()).await;
        }
        debug!(event = %events.request, "cloud request sent");

        let reply = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => CloudReply::Failed("cloud waiter dropped".to_string()),
            Err(_) => {
                self.dispatcher.cancel(waiter_id);
                CloudReply::Failed(format!(
                    "no {} within {}ms",
                    events.success,
                    self.request_timeout.as_millis()
                ))
            }
        };

        match reply {
            CloudReply::Success(data) => {
                if op.is_write() {
                    if let Some(name) = op.broadcast_event(entity) {
                        if name != events.success {
                            self.dispatcher
                                .events
                                .publish(BroadcastEvent::new(name, data.clone()));
                        }
                    }
                } else {
                    self.join_accessible_rooms(entity, &data);
                }
                Ok(Envelope::success(data))
            }
            CloudReply::Failed(reason) => self.fallback(entity, op, &args, &reason).await,
        }
    }

    async fn fallback(
        &self,
        entity: EntityKind,
        op: OpKind,
        args: &OpArgs,
        reason: &str,
    ) -> SyncResult<Envelope> {
        let procedure = op.procedure(entity);
        info!(procedure = %procedure, reason, "cloud unavailable, using command executor");
        self.executor.invoke(&procedure, args.to_value()).await
    }

    /// Joins rooms for fetched records the configured user can access.
    fn join_accessible_rooms(&self, entity: EntityKind, data: &Value) {
        let Some(user) = self.user_id.as_deref() else {
            return;
        };
        let records: Vec<&Value> = match data {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for record in records {
            let Some(header) = EntityHeader::from_value(record) else {
                continue;
            };
            let Some(id) = header.id.as_deref() else {
                continue;
            };
            if !header.is_accessible_by(user) {
                continue;
            }
            if let Err(e) = self.join_room(entity, id) {
                warn!(entity = %entity, id, error = %e, "failed to join room");
            }
        }
    }

    /// Subscribes to live updates for one record. Returns false if already joined.
    pub fn join_room(&self, entity: EntityKind, id: &str) -> SyncResult<bool> {
        let key = (entity, id.to_string());
        if !self
            .dispatcher
            .rooms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone())
        {
            return Ok(false);
        }
        let sent = CloudFrame::join_room(entity, id)
            .to_json()
            .map_err(SyncError::from)
            .and_then(|frame| self.link.send_text(frame));
        if let Err(e) = sent {
            self.dispatcher
                .rooms
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&key);
            return Err(e);
        }
        debug!(entity = %entity, id, "joined room");
        Ok(true)
    }

    /// Leaves a record's room. Returns false if it was not joined.
    pub fn leave_room(&self, entity: EntityKind, id: &str) -> SyncResult<bool> {
        let removed = self
            .dispatcher
            .rooms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(entity, id.to_string()));
        if !removed {
            return Ok(false);
        }
        self.link
            .send_text(CloudFrame::leave_room(entity, id).to_json()?)?;
        debug!(entity = %entity, id, "left room");
        Ok(true)
    }

    /// Rooms currently joined, sorted.
    pub fn joined_rooms(&self) -> Vec<(EntityKind, String)> {
        let mut rooms: Vec<_> = self
            .dispatcher
            .rooms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect();
        rooms.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        rooms
    }

    /// Subscribes to a cloud event by name.
    pub fn on_event(&self, name: impl Into<String>) -> EventStream {
        self.dispatcher.events.subscribe(name)
    }

    /// Number of requests waiting for a cloud answer.
    pub fn pending_count(&self) -> usize {
        self.dispatcher.pending()
    }
}

impl Drop for CloudChannel {
    fn drop(&mut self) {
        self.link.close();
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod tests;
