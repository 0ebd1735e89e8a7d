// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entity operations and their names on each transport.
//!
//! One [`OpKind`] maps to:
//! - a Local Channel action (`getAll`, `get`, ...)
//! - a Command Executor procedure (`todoGetAll`, `todoGet`, ...)
//! - a Cloud Channel event triple (`get-todos` / `todos-retrieved` / `todos-retrieve-error`)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::entity::{EntityKind, SyncMetadata};

/// Local Channel action for a whole-collection import (cloud to local).
pub const IMPORT_ACTION: &str = "import";
/// Local Channel action for a whole-collection export (local to cloud).
pub const EXPORT_ACTION: &str = "export";
/// Executor procedure for a whole-collection import.
pub const IMPORT_PROCEDURE: &str = "syncImport";
/// Executor procedure for a whole-collection export.
pub const EXPORT_PROCEDURE: &str = "syncExport";

/// CRUD operations exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpKind {
    GetAll,
    Get,
    Create,
    Update,
    UpdateAll,
    Delete,
}

/// Event names used by the Cloud Channel for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEvents {
    /// Event emitted to the server.
    pub request: String,
    /// Event the server answers with on success.
    pub success: String,
    /// Event the server answers with on failure.
    pub failure: String,
}

impl OpKind {
    /// Local Channel action name.
    pub fn action(&self) -> &'static str {
        match self {
            OpKind::GetAll => "getAll",
            OpKind::Get => "get",
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::UpdateAll => "updateAll",
            OpKind::Delete => "delete",
        }
    }

    /// Command Executor procedure name, e.g. `todoGetAll`.
    pub fn procedure(&self, entity: EntityKind) -> String {
        let suffix = match self {
            OpKind::GetAll => "GetAll",
            OpKind::Get => "Get",
            OpKind::Create => "Create",
            OpKind::Update => "Update",
            OpKind::UpdateAll => "UpdateAll",
            OpKind::Delete => "Delete",
        };
        format!("{}{}", entity.as_str(), suffix)
    }

    /// True for operations that change backend state.
    pub fn is_write(&self) -> bool {
        !matches!(self, OpKind::GetAll | OpKind::Get)
    }

    /// True when the cloud backend implements this operation.
    pub fn is_cloud_served(&self) -> bool {
        !matches!(self, OpKind::UpdateAll)
    }

    /// Cloud Channel events, or `None` if the cloud backend has no such operation.
    pub fn cloud_events(&self, entity: EntityKind) -> Option<CloudEvents> {
        let one = entity.as_str();
        let many = entity.plural();
        let (request, success, failure) = match self {
            OpKind::GetAll => (
                format!("get-{many}"),
                format!("{many}-retrieved"),
                format!("{many}-retrieve-error"),
            ),
            OpKind::Get => (
                format!("get-{one}-by-field"),
                format!("{one}-retrieved"),
                format!("{one}-retrieve-error"),
            ),
            OpKind::Create => (
                format!("create-{one}"),
                format!("{one}-create-success"),
                format!("{one}-create-error"),
            ),
            OpKind::Update => (
                format!("update-{one}"),
                format!("{one}-updated"),
                format!("{one}-update-error"),
            ),
            OpKind::Delete => (
                format!("delete-{one}"),
                format!("{one}-deleted"),
                format!("{one}-delete-error"),
            ),
            OpKind::UpdateAll => return None,
        };
        Some(CloudEvents {
            request,
            success,
            failure,
        })
    }

    /// Broadcast re-published to cloud subscribers after a successful write.
    pub fn broadcast_event(&self, entity: EntityKind) -> Option<String> {
        let one = entity.as_str();
        match self {
            OpKind::Create => Some(format!("{one}-created")),
            OpKind::Update => Some(format!("{one}-updated")),
            OpKind::Delete => Some(format!("{one}-deleted")),
            _ => None,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action())
    }
}

/// Arguments for one entity operation, identical on every transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub sync_metadata: SyncMetadata,
}

impl OpArgs {
    pub fn new(sync_metadata: SyncMetadata) -> Self {
        OpArgs {
            sync_metadata,
            ..OpArgs::default()
        }
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serializes the arguments as a JSON object.
    pub fn to_value(&self) -> Value {
        // Every field is a plain JSON value, so this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
