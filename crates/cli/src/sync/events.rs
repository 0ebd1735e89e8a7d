// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of broadcast events to named subscriptions.

use std::pin::Pin;

use futures_util::Stream;
use serde_json::Value;
use tm_core::BroadcastEvent;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{trace, warn};

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_BUFFER: usize = 256;

/// Payloads of one named event, in arrival order.
///
/// Ends only when the owning channel is dropped.
pub type EventStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

/// Broadcast bus for one channel.
pub struct EventBus {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER);
        EventBus { tx }
    }

    /// Delivers an event to every current subscriber.
    pub fn publish(&self, event: BroadcastEvent) {
        trace!(event = %event.event, "publishing broadcast");
        // No subscribers is not an error
        let _ = self.tx.send(event);
    }

    /// Subscribes to payloads of the event called `name`.
    pub fn subscribe(&self, name: impl Into<String>) -> EventStream {
        let rx = self.tx.subscribe();
        let name = name.into();
        Box::pin(futures_util::stream::unfold(
            (rx, name),
            |(mut rx, name)| async move {
                loop {
                    match rx.recv().await {
                        Ok(event) if event.event == name => {
                            return Some((event.payload, (rx, name)));
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(event = %name, skipped, "subscriber lagged, events dropped");
                            continue;
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            },
        ))
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
