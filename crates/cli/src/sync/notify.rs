// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing notifications raised by background sync work.

use tm_core::ResponseStatus;
use tracing::{error, info, warn};

/// Receives status notifications such as "export failed".
pub trait NotificationSink: Send + Sync {
    fn notify(&self, status: ResponseStatus, message: &str);
}

/// Sink that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, status: ResponseStatus, message: &str) {
        match status {
            ResponseStatus::Success | ResponseStatus::Info => info!(%status, "{}", message),
            ResponseStatus::Warning => warn!(%status, "{}", message),
            ResponseStatus::Error => error!(%status, "{}", message),
        }
    }
}
