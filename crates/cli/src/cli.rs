// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tm_core::{SyncMetadata, Visibility};

/// Parse a JSON argument.
fn json_value(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| e.to_string())
}

/// Parse a JSON object argument.
fn json_object(s: &str) -> Result<Value, String> {
    match json_value(s)? {
        v @ Value::Object(_) => Ok(v),
        _ => Err("expected a JSON object".to_string()),
    }
}

/// Parse a visibility name.
fn visibility(s: &str) -> Result<Visibility, String> {
    s.parse().map_err(|e: tm_core::Error| e.to_string())
}

/// Which bulk transfer `tm sync` runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SyncMode {
    /// Export local changes, then import cloud state
    #[default]
    All,
    /// Pull cloud state into the local store
    Import,
    /// Push local state to the cloud
    Export,
}

#[derive(Parser, Debug)]
#[command(name = "tm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Local-first task client with cloud sync")]
#[command(
    long_about = "Local-first task client with cloud sync.\n\n\
    Operations go to the local backend when it is up, to the cloud for shared \
    records, and to the command executor otherwise."
)]
pub struct Cli {
    /// Config file (default: $TM_CONFIG or <config dir>/taskmate/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Treat the record as shared with a team (isPrivate = false)
    #[arg(long, global = true)]
    pub shared: bool,

    /// Caller does not own the record (isOwner = false)
    #[arg(long, global = true)]
    pub not_owner: bool,

    /// Seconds to wait for backend connections before routing
    #[arg(long, global = true, value_name = "secs", default_value_t = 2)]
    pub wait: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Sync metadata implied by the global flags.
    pub fn sync_metadata(&self) -> SyncMetadata {
        SyncMetadata::new(!self.not_owner, !self.shared)
    }

    pub fn wait_duration(&self) -> Duration {
        Duration::from_secs(self.wait)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List records of an entity
    #[command(after_help = "\
Examples:
  tm list todo                              All todos
  tm list task --filter '{\"done\": false}'   Open tasks
  tm list todo --shared                     Team todos (cloud when local is down)")]
    List {
        /// Entity kind (todo, task, subtask)
        entity: String,

        /// Filter object passed to the backend
        #[arg(long, value_parser = json_object)]
        filter: Option<Value>,
    },

    /// Show one record
    Get {
        /// Entity kind (todo, task, subtask)
        entity: String,
        /// Record id
        id: String,
    },

    /// Create a record from a JSON object
    #[command(after_help = "\
Examples:
  tm create todo '{\"title\": \"Write docs\"}'")]
    Create {
        /// Entity kind (todo, task, subtask)
        entity: String,
        /// Record fields
        #[arg(value_parser = json_object)]
        data: Value,
    },

    /// Update a record with a JSON object of changed fields
    Update {
        /// Entity kind (todo, task, subtask)
        entity: String,
        /// Record id
        id: String,
        /// Changed fields
        #[arg(value_parser = json_object)]
        data: Value,
    },

    /// Update many records at once
    #[command(name = "update-all")]
    UpdateAll {
        /// Entity kind (todo, task, subtask)
        entity: String,
        /// Records or changes, usually a JSON array
        #[arg(value_parser = json_value)]
        data: Value,
    },

    /// Delete a record
    Delete {
        /// Entity kind (todo, task, subtask)
        entity: String,
        /// Record id
        id: String,
    },

    /// Run a bulk transfer between the local store and the cloud
    Sync {
        #[arg(value_enum, default_value_t = SyncMode::All)]
        mode: SyncMode,
    },

    /// Run the transfer a visibility change requires
    #[command(after_help = "\
Examples:
  tm visibility private team    Export after sharing a record
  tm visibility team private    Import after unsharing a record")]
    Visibility {
        /// Previous visibility (private, team)
        #[arg(value_parser = visibility)]
        from: Visibility,
        /// New visibility (private, team)
        #[arg(value_parser = visibility)]
        to: Visibility,
    },

    /// Print broadcast payloads for an event as JSON lines
    Watch {
        /// Event name, e.g. todo-updated
        event: String,

        /// Listen on the cloud channel instead of the local one
        #[arg(long)]
        cloud: bool,

        /// Exit after this many events
        #[arg(long, short = 'n', value_name = "count")]
        count: Option<usize>,
    },

    /// Show connection state of every backend
    Status,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
