// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;

use crate::sync::ChannelState;

use super::Context;

/// Output of `tm status`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub local: ChannelState,
    /// Null when no cloud backend is configured.
    pub cloud: Option<ChannelState>,
    pub executor_socket: String,
    pub entities: Vec<String>,
    pub syncing: bool,
}

pub fn report(ctx: &Context) -> StatusReport {
    StatusReport {
        local: ctx.local.state(),
        cloud: ctx.cloud.as_ref().map(|c| c.state()),
        executor_socket: ctx.executor_socket.display().to_string(),
        entities: ctx
            .gateway
            .entities()
            .iter()
            .map(|e| e.as_str().to_string())
            .collect(),
        syncing: ctx.orchestrator.is_syncing(),
    }
}
