// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tm-core: Shared library for the taskmate sync layer
//!
//! This crate provides the data model and wire formats used by the taskmate
//! transports: entity kinds, sync metadata, the result envelope, operation
//! names, and the local/cloud WebSocket frames. It performs no I/O.

pub mod entity;
pub mod envelope;
pub mod error;
pub mod op;
pub mod protocol;

pub use entity::{EntityHeader, EntityKind, SyncMetadata, Visibility};
pub use envelope::{Envelope, ResponseStatus};
pub use error::{Error, Result};
pub use op::{CloudEvents, OpArgs, OpKind};
pub use protocol::{BroadcastEvent, CloudFrame, LocalFrame, LocalRequest};
