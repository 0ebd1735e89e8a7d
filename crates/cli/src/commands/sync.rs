// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use tm_core::{Envelope, Visibility};

use crate::cli::SyncMode;
use crate::error::Result;
use crate::sync::{SyncError, SyncOrchestrator};

/// Runs a bulk transfer. A non-success envelope becomes an error.
pub async fn run(orchestrator: &SyncOrchestrator, mode: SyncMode) -> Result<Envelope> {
    let envelope = match mode {
        SyncMode::All => orchestrator.sync_all().await?,
        SyncMode::Import => orchestrator.import().await?,
        SyncMode::Export => orchestrator.export().await?,
    };
    if !envelope.is_success() {
        return Err(SyncError::Rejected {
            status: envelope.status,
            message: envelope.message,
        }
        .into());
    }
    Ok(envelope)
}

/// Output of `tm visibility`.
#[derive(Debug, Serialize, PartialEq)]
pub struct VisibilityReport {
    pub from: Visibility,
    pub to: Visibility,
    /// `import`, `export`, or null when nothing moved (no change, or a sync
    /// was already running).
    pub direction: Option<String>,
}

pub async fn visibility(
    orchestrator: &SyncOrchestrator,
    from: Visibility,
    to: Visibility,
) -> VisibilityReport {
    let direction = orchestrator.on_visibility_change(from, to).await;
    VisibilityReport {
        from,
        to,
        direction: direction.map(|d| d.to_string()),
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
