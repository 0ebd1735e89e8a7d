// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync Orchestrator: whole-collection import/export.
//!
//! At most one bulk sync runs at a time; a second caller is rejected with
//! [`SyncError::SyncInProgress`] instead of queueing. The `syncing` flag is
//! owned here and only observed elsewhere.

use std::fmt;
use std::sync::Arc;

use tm_core::{Envelope, ResponseStatus, Visibility};
use tokio::sync::watch;
use tracing::{info, warn};

use super::error::{SyncError, SyncResult};
use super::executor::BoxFuture;
use super::notify::NotificationSink;

/// Backend able to run whole-collection transfers.
pub trait BulkSync: Send + Sync {
    /// Pulls cloud state into the local store.
    fn import(&self) -> BoxFuture<'_, SyncResult<Envelope>>;
    /// Pushes local state to the cloud.
    fn export(&self) -> BoxFuture<'_, SyncResult<Envelope>>;
}

/// Direction of a bulk transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    Import,
    Export,
}

impl SyncDirection {
    /// Transfer needed when a record moves from `from` to `to`.
    pub fn for_change(from: Visibility, to: Visibility) -> Option<Self> {
        match (from, to) {
            (Visibility::Team, Visibility::Private) => Some(SyncDirection::Import),
            (Visibility::Private, Visibility::Team) => Some(SyncDirection::Export),
            _ => None,
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Import => write!(f, "import"),
            SyncDirection::Export => write!(f, "export"),
        }
    }
}

/// Clears the syncing flag when the running sync ends, however it ends.
struct SyncingGuard<'a> {
    flag: &'a watch::Sender<bool>,
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.flag.send_replace(false);
    }
}

/// Coordinates bulk transfers between the local store and the cloud.
pub struct SyncOrchestrator {
    backend: Arc<dyn BulkSync>,
    notifier: Arc<dyn NotificationSink>,
    syncing: watch::Sender<bool>,
}

impl SyncOrchestrator {
    pub fn new(backend: Arc<dyn BulkSync>, notifier: Arc<dyn NotificationSink>) -> Self {
        let (syncing, _rx) = watch::channel(false);
        SyncOrchestrator {
            backend,
            notifier,
            syncing,
        }
    }

    pub fn is_syncing(&self) -> bool {
        *self.syncing.borrow()
    }

    /// Observes the syncing flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.syncing.subscribe()
    }

    fn begin(&self) -> SyncResult<SyncingGuard<'_>> {
        let mut acquired = false;
        self.syncing.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                acquired = true;
                true
            }
        });
        if acquired {
            Ok(SyncingGuard {
                flag: &self.syncing,
            })
        } else {
            Err(SyncError::SyncInProgress)
        }
    }

    pub async fn import(&self) -> SyncResult<Envelope> {
        let _guard = self.begin()?;
        info!("importing from cloud");
        self.backend.import().await
    }

    pub async fn export(&self) -> SyncResult<Envelope> {
        let _guard = self.begin()?;
        info!("exporting to cloud");
        self.backend.export().await
    }

    /// Exports, then imports only if the export succeeded.
    ///
    /// A non-success export envelope is returned as is.
    pub async fn sync_all(&self) -> SyncResult<Envelope> {
        let _guard = self.begin()?;
        info!("full sync: exporting to cloud");
        let exported = self.backend.export().await?;
        if !exported.is_success() {
            warn!(status = %exported.status, message = %exported.message, "export failed, skipping import");
            return Ok(exported);
        }
        info!("full sync: importing from cloud");
        self.backend.import().await
    }

    /// Runs the transfer a visibility change requires, if any.
    ///
    /// Returns the direction only when a transfer actually ran; `None` when
    /// nothing had to move or another sync was already running. Failures
    /// are reported to the notification sink rather than returned.
    pub async fn on_visibility_change(
        &self,
        from: Visibility,
        to: Visibility,
    ) -> Option<SyncDirection> {
        let direction = SyncDirection::for_change(from, to)?;
        let result = match direction {
            SyncDirection::Import => self.import().await,
            SyncDirection::Export => self.export().await,
        };
        let failure = match result {
            Err(SyncError::SyncInProgress) => {
                info!(%direction, %from, %to, "sync already running, skipping visibility sync");
                return None;
            }
            Ok(envelope) if envelope.is_success() => None,
            Ok(envelope) => Some(envelope.message),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = failure {
            warn!(%direction, %from, %to, reason = %reason, "visibility sync failed");
            self.notifier.notify(
                ResponseStatus::Warning,
                &format!("{} after visibility change failed: {}", direction, reason),
            );
        }
        Some(direction)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
