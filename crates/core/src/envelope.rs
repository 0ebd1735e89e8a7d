// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The `{status, message, data}` result envelope returned by every backend.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[serde(alias = "Success", alias = "SUCCESS")]
    Success,
    #[serde(alias = "Info", alias = "INFO")]
    Info,
    #[serde(alias = "Warning", alias = "WARNING")]
    Warning,
    #[serde(alias = "Error", alias = "ERROR")]
    Error,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "success",
            ResponseStatus::Info => "info",
            ResponseStatus::Warning => "warning",
            ResponseStatus::Error => "error",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result envelope.
///
/// `data` stays untyped here; call sites pick the concrete type with
/// [`Envelope::into_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Creates an envelope with an explicit status.
    pub fn new(status: ResponseStatus, message: impl Into<String>, data: Value) -> Self {
        Envelope {
            status,
            message: message.into(),
            data,
        }
    }

    /// Creates a successful envelope carrying `data`.
    pub fn success(data: Value) -> Self {
        Envelope::new(ResponseStatus::Success, "", data)
    }

    /// Creates an error envelope with no data.
    pub fn error(message: impl Into<String>) -> Self {
        Envelope::new(ResponseStatus::Error, message, Value::Null)
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Deserializes `data` into the caller's type.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
