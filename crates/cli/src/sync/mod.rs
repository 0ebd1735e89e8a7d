// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dual-source data sync layer.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!   callers ────────►│ SyncGateway  │◄──── SyncOrchestrator (import/export)
//!                    └──────┬───────┘
//!          ┌────────────────┼──────────────────┐
//!          ▼                ▼                  ▼
//!   ┌─────────────┐  ┌──────────────┐  ┌─────────────────┐
//!   │LocalChannel │  │ CloudChannel │─►│ CommandExecutor │
//!   │ (requestId) │  │   (events)   │  │  (procedures)   │
//!   └─────────────┘  └──────────────┘  └─────────────────┘
//! ```
//!
//! # Features
//!
//! - Local-first routing with cloud and executor fallbacks
//! - Request/response correlation over a single WebSocket
//! - Event-based cloud requests with executor fallback on any failure
//! - Automatic reconnect with a fixed delay
//! - Broadcast subscriptions by event name
//! - Injectable backend traits for testing

mod cloud;
mod error;
mod events;
mod executor;
mod gateway;
mod local;
mod notify;
mod orchestrator;
mod socket;

pub use cloud::{CloudChannel, CloudChannelConfig};
pub use error::{SyncError, SyncResult};
pub use events::{EventBus, EventStream};
pub use executor::{BoxFuture, CommandExecutor, IpcExecutor, DEFAULT_EXECUTOR_TIMEOUT};
pub use gateway::{select_route, unwrap_envelope, CloudBackend, LocalBackend, Route, SyncGateway};
pub use local::{
    LocalChannel, LocalChannelConfig, DEFAULT_LOCAL_URL, DEFAULT_RECONNECT_DELAY,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use notify::{LogSink, NotificationSink};
pub use orchestrator::{BulkSync, SyncDirection, SyncOrchestrator};
pub use socket::{ChannelState, SharedChannelState};

#[cfg(test)]
pub(crate) mod test_helpers;
