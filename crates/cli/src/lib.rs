// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tmrs - Sync layer for a local-first task client.
//!
//! This crate provides the core functionality for the `tm` CLI tool.
//! Entity operations are routed to a local backend, a cloud backend, or a
//! command executor, depending on connectivity and who owns the record.
//!
//! # Main Components
//!
//! - [`SyncGateway`](sync::SyncGateway) - Routes CRUD operations across transports
//! - [`SyncOrchestrator`](sync::SyncOrchestrator) - Bulk import/export with a single-flight guard
//! - [`LocalChannel`](sync::LocalChannel) / [`CloudChannel`](sync::CloudChannel) - WebSocket transports
//! - [`Config`] - Endpoints, timeouts, and the entity allow-list
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use tmrs::sync::{LocalChannel, LocalChannelConfig, IpcExecutor, SyncGateway};
//!
//! let local = Arc::new(LocalChannel::new(LocalChannelConfig::default()));
//! local.connect();
//! let gateway = SyncGateway::new(local, Arc::new(IpcExecutor::new(socket)));
//! let todos: Vec<Todo> = gateway.get_all("todo", None, None).await?;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, SyncMode};
pub use config::Config;
pub use error::{Error, Result};

use commands::Context;

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
    rt.block_on(run_async(cli))
}

async fn run_async(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    config.validate()?;

    let meta = cli.sync_metadata();
    let ctx = Context::start(&config, cli.wait_duration()).await?;
    let mut stdout = std::io::stdout();
    let result = commands::run(&ctx, cli.command, meta, &mut stdout).await;
    ctx.shutdown();
    result
}
