// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tm_core::{EntityKind, ResponseStatus};

/// Comma-separated entity names, as shown in hints.
pub(crate) fn entity_names(kinds: &[EntityKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error type for sync layer operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Entity name is unknown or not in the gateway allow-list.
    #[error("unsupported entity: '{name}'\n  hint: supported entities are: {supported}")]
    UnsupportedEntity { name: String, supported: String },

    /// The channel has no live connection.
    #[error("channel is not connected")]
    NotConnected,

    /// No response arrived within the request timeout.
    #[error("request '{action}' timed out after {}ms", after.as_millis())]
    Timeout { action: String, after: Duration },

    /// The backend answered with a non-success envelope.
    #[error("{status}: {message}")]
    Rejected {
        status: ResponseStatus,
        message: String,
    },

    /// WebSocket or socket level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be interpreted.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The command executor could not be reached or failed.
    #[error("command executor error: {0}")]
    Executor(String),

    /// A bulk sync is already running.
    #[error("a sync is already in progress")]
    SyncInProgress,

    /// Response data did not match the requested type.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tm_core::Error> for SyncError {
    fn from(e: tm_core::Error) -> Self {
        match e {
            tm_core::Error::UnsupportedEntity(name) => SyncError::UnsupportedEntity {
                name,
                supported: entity_names(&EntityKind::ALL),
            },
            tm_core::Error::Json(e) => SyncError::Json(e),
            other => SyncError::Protocol(other.to_string()),
        }
    }
}

/// Result type for sync layer operations.
pub type SyncResult<T> = Result<T, SyncError>;
