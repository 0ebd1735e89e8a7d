// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket frames exchanged with the local and cloud backends.
//!
//! Local Channel:
//! - Client sends `{action, requestId, ...payload}`
//! - Backend answers `{requestId, response: {status, message, data}}` or
//!   `{requestId, status, message, data}`
//! - Backend broadcasts `{event, data}` with no `requestId`
//!
//! Cloud Channel:
//! - Both directions carry named events `{event, data}`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::EntityKind;
use crate::envelope::Envelope;

/// Event the cloud backend emits when it cannot serve the connection.
pub const CONNECT_ERROR_EVENT: &str = "connect_error";

/// Request sent on the Local Channel.
///
/// Correlated requests carry a `requestId`; fire-and-forget emits do not.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRequest {
    pub action: String,
    pub request_id: Option<String>,
    pub payload: Map<String, Value>,
}

impl LocalRequest {
    /// Creates a correlated request. A non-object payload is carried under `data`.
    pub fn new(action: impl Into<String>, request_id: impl Into<String>, payload: Value) -> Self {
        let mut request = LocalRequest::emit(action, payload);
        request.request_id = Some(request_id.into());
        request
    }

    /// Creates a fire-and-forget message with no `requestId`.
    pub fn emit(action: impl Into<String>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        LocalRequest {
            action: action.into(),
            request_id: None,
            payload,
        }
    }

    /// Builds the flat wire object; `action` and `requestId` win over payload keys.
    pub fn to_value(&self) -> Value {
        let mut map = self.payload.clone();
        map.insert("action".to_string(), Value::String(self.action.clone()));
        match &self.request_id {
            Some(id) => {
                map.insert("requestId".to_string(), Value::String(id.clone()));
            }
            None => {
                map.remove("requestId");
            }
        }
        Value::Object(map)
    }

    /// Serializes the request to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_value())
    }
}

/// Unsolicited message pushed by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub event: String,
    pub payload: Value,
}

impl BroadcastEvent {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        BroadcastEvent {
            event: event.into(),
            payload,
        }
    }
}

/// Classification of one incoming Local Channel frame.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalFrame {
    /// Answer to a correlated request. `result` is `Err` when the envelope
    /// is unreadable.
    Response {
        request_id: String,
        result: Result<Envelope, String>,
    },
    /// Broadcast with no correlation id.
    Broadcast(BroadcastEvent),
    /// Neither a response nor a broadcast.
    Unroutable,
}

impl LocalFrame {
    /// Parses and classifies a text frame.
    ///
    /// Fails only when the text is not JSON at all.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(obj) = value else {
            return Ok(LocalFrame::Unroutable);
        };

        let nested = obj.get("response").filter(|r| r.is_object());
        let request_id = obj
            .get("requestId")
            .and_then(Value::as_str)
            .or_else(|| {
                nested
                    .and_then(|r| r.get("requestId"))
                    .and_then(Value::as_str)
            });

        if let Some(request_id) = request_id {
            let source = nested.cloned().unwrap_or_else(|| Value::Object(obj.clone()));
            let result = serde_json::from_value::<Envelope>(source).map_err(|e| e.to_string());
            return Ok(LocalFrame::Response {
                request_id: request_id.to_string(),
                result,
            });
        }

        if let Some(event) = obj.get("event").and_then(Value::as_str) {
            let payload = obj
                .get("data")
                .or_else(|| obj.get("payload"))
                .cloned()
                .unwrap_or(Value::Null);
            return Ok(LocalFrame::Broadcast(BroadcastEvent::new(event, payload)));
        }

        Ok(LocalFrame::Unroutable)
    }
}

/// Named event on the Cloud Channel, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl CloudFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        CloudFrame {
            event: event.into(),
            data,
        }
    }

    /// Creates a `join-<entity>-room` frame.
    pub fn join_room(entity: EntityKind, id: &str) -> Self {
        CloudFrame::new(
            format!("join-{}-room", entity.as_str()),
            serde_json::json!({ "id": id }),
        )
    }

    /// Creates a `leave-<entity>-room` frame.
    pub fn leave_room(entity: EntityKind, id: &str) -> Self {
        CloudFrame::new(
            format!("leave-{}-room", entity.as_str()),
            serde_json::json!({ "id": id }),
        )
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
