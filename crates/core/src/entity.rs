// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entity kinds and the ownership/visibility data used for routing.
//!
//! Entity payloads are opaque to the sync layer. The only fields it ever
//! reads are the ones in [`EntityHeader`], and it never writes any of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kinds of records the sync layer knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Top-level personal or team todo.
    Todo,
    /// Task belonging to a todo.
    Task,
    /// Checklist item belonging to a task.
    Subtask,
}

impl EntityKind {
    /// All known entity kinds, in dependency order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Todo, EntityKind::Task, EntityKind::Subtask];

    /// Returns the singular name used in procedure names and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Todo => "todo",
            EntityKind::Task => "task",
            EntityKind::Subtask => "subtask",
        }
    }

    /// Returns the plural name used by collection events (`get-todos`).
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Todo => "todos",
            EntityKind::Task => "tasks",
            EntityKind::Subtask => "subtasks",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "todos" => Ok(EntityKind::Todo),
            "task" | "tasks" => Ok(EntityKind::Task),
            "subtask" | "subtasks" => Ok(EntityKind::Subtask),
            _ => Err(Error::UnsupportedEntity(s.to_string())),
        }
    }
}

/// Sharing visibility of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Local-only, never pushed to the shared backend.
    #[default]
    Private,
    /// Shared with a team through the cloud backend.
    Team,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Team => "team",
        }
    }

    pub fn is_private(&self) -> bool {
        *self == Visibility::Private
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "team" | "shared" => Ok(Visibility::Team),
            _ => Err(Error::InvalidVisibility(s.to_string())),
        }
    }
}

/// Caller's relationship to the record an operation touches.
///
/// Recomputed for every call and never persisted. The default is a
/// private record owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub is_owner: bool,
    pub is_private: bool,
}

impl Default for SyncMetadata {
    fn default() -> Self {
        SyncMetadata {
            is_owner: true,
            is_private: true,
        }
    }
}

impl SyncMetadata {
    pub fn new(is_owner: bool, is_private: bool) -> Self {
        SyncMetadata {
            is_owner,
            is_private,
        }
    }

    /// Metadata for a shared record (`isPrivate = false`).
    pub fn shared(is_owner: bool) -> Self {
        SyncMetadata::new(is_owner, false)
    }

    /// Derive metadata from the caller's identity and a record header.
    pub fn for_record(caller: &str, header: &EntityHeader) -> Self {
        SyncMetadata {
            is_owner: header.user_id.as_deref() == Some(caller),
            is_private: header.visibility.is_private(),
        }
    }
}

/// The routing-relevant subset of an entity payload.
///
/// Deserialized leniently from the opaque record; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHeader {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl EntityHeader {
    /// Reads the header out of a record, or `None` if it is not an object.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// True if `user` created the record or is one of its assignees.
    pub fn is_accessible_by(&self, user: &str) -> bool {
        self.user_id.as_deref() == Some(user) || self.assignees.iter().any(|a| a == user)
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
