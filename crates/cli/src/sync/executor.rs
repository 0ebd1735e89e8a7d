// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command Executor: named procedures served by a local privileged process.
//!
//! The executor needs no network connection and is always reachable by
//! contract, so it is the fallback of last resort for every operation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use tm_core::Envelope;
use tm_ipc::{framing, ProcedureCall};
use tokio::net::UnixStream;
use tracing::debug;

use super::error::{SyncError, SyncResult};

/// Boxed future returned by the transport seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default time allowed for one procedure call.
pub const DEFAULT_EXECUTOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Invokes named procedures with JSON arguments.
pub trait CommandExecutor: Send + Sync {
    /// Calls `procedure` and returns its envelope.
    fn invoke<'a>(&'a self, procedure: &'a str, args: Value) -> BoxFuture<'a, SyncResult<Envelope>>;
}

/// Executor reached over a Unix socket, one call per connection.
pub struct IpcExecutor {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcExecutor {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        IpcExecutor {
            socket_path: socket_path.into(),
            timeout: DEFAULT_EXECUTOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn call(&self, procedure: &str, args: Value) -> SyncResult<Envelope> {
        let mut stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            SyncError::Executor(format!(
                "cannot reach {}: {}",
                self.socket_path.display(),
                e
            ))
        })?;
        let call = ProcedureCall::new(procedure, args);
        framing::write_call(&mut stream, &call)
            .await
            .map_err(|e| SyncError::Executor(e.to_string()))?;
        framing::read_reply(&mut stream)
            .await
            .map_err(|e| SyncError::Executor(e.to_string()))
    }
}

impl CommandExecutor for IpcExecutor {
    fn invoke<'a>(&'a self, procedure: &'a str, args: Value) -> BoxFuture<'a, SyncResult<Envelope>> {
        Box::pin(async move {
            debug!(procedure, "invoking command executor");
            match tokio::time::timeout(self.timeout, self.call(procedure, args)).await {
                Ok(result) => result,
                Err(_) => Err(SyncError::Timeout {
                    action: procedure.to_string(),
                    after: self.timeout,
                }),
            }
        })
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
