// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `config.toml` under the user's config
//! directory (or at `$TM_CONFIG`) and includes:
//! - `user_id`: identity used for cloud room membership
//! - `[local]`: local backend endpoint and timings
//! - `[cloud]`: optional cloud backend endpoint and timings
//! - `[executor]`: command executor socket
//! - `[sync]`: entity allow-list
//!
//! Every field has a default, so a missing file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tm_core::EntityKind;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{CloudChannelConfig, LocalChannelConfig, DEFAULT_LOCAL_URL};

const APP_DIR_NAME: &str = "taskmate";
const CONFIG_FILE_NAME: &str = "config.toml";
const SOCKET_FILE_NAME: &str = "executor.sock";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Identity of the signed-in user. Without it no cloud rooms are joined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Local backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// WebSocket URL (default: `ws://127.0.0.1:8766`).
    #[serde(default = "default_local_url")]
    pub url: String,
    /// Time to wait for a correlated response in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause between reconnect attempts in seconds (default: 5).
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            url: default_local_url(),
            request_timeout_secs: default_request_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

/// Cloud backend configuration (optional - if `url` is absent, shared
/// records fall back to the command executor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// WebSocket URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Time to wait for a success or failure event in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause between reconnect attempts in seconds (default: 5).
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            url: None,
            request_timeout_secs: default_request_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

/// Command executor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Unix socket path (default: `<runtime dir>/taskmate/executor.sock`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<PathBuf>,
    /// Per-call timeout in seconds (default: 5).
    #[serde(default = "default_executor_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            socket: None,
            timeout_secs: default_executor_timeout_secs(),
        }
    }
}

/// Sync behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Entity kinds the gateway accepts (default: todo, task, subtask).
    #[serde(default = "default_entities")]
    pub entities: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            entities: default_entities(),
        }
    }
}

fn default_local_url() -> String {
    DEFAULT_LOCAL_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_executor_timeout_secs() -> u64 {
    5
}

fn default_entities() -> Vec<String> {
    EntityKind::ALL
        .iter()
        .map(|e| e.as_str().to_string())
        .collect()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Loads `explicit` if given (it must exist), otherwise the default
    /// location, falling back to defaults when that file is absent.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Config::load(path);
        }
        match default_path() {
            Some(path) if path.exists() => Config::load(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Checks URLs, timeouts, reconnect delays and entity names.
    pub fn validate(&self) -> Result<()> {
        validate_ws_url("local.url", &self.local.url)?;
        if let Some(url) = &self.cloud.url {
            validate_ws_url("cloud.url", url)?;
        }
        for (field, secs) in [
            ("local.request_timeout_secs", self.local.request_timeout_secs),
            ("cloud.request_timeout_secs", self.cloud.request_timeout_secs),
            ("executor.timeout_secs", self.executor.timeout_secs),
            ("local.reconnect_delay_secs", self.local.reconnect_delay_secs),
            ("cloud.reconnect_delay_secs", self.cloud.reconnect_delay_secs),
        ] {
            if secs == 0 {
                return Err(Error::InvalidConfig(format!("{} must be at least 1", field)));
            }
        }
        self.entities()?;
        Ok(())
    }

    /// Parsed entity allow-list.
    pub fn entities(&self) -> Result<Vec<EntityKind>> {
        if self.sync.entities.is_empty() {
            return Err(Error::InvalidConfig(
                "sync.entities must name at least one entity".to_string(),
            ));
        }
        let mut kinds = Vec::new();
        for name in &self.sync.entities {
            let kind: EntityKind = name
                .parse()
                .map_err(|e: tm_core::Error| Error::InvalidConfig(e.to_string()))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    pub fn local_channel(&self) -> LocalChannelConfig {
        LocalChannelConfig {
            url: self.local.url.clone(),
            request_timeout: Duration::from_secs(self.local.request_timeout_secs),
            reconnect_delay: Duration::from_secs(self.local.reconnect_delay_secs),
        }
    }

    /// Cloud channel settings, or `None` when no cloud URL is configured.
    pub fn cloud_channel(&self) -> Option<CloudChannelConfig> {
        let url = self.cloud.url.as_ref()?;
        Some(CloudChannelConfig {
            url: url.clone(),
            request_timeout: Duration::from_secs(self.cloud.request_timeout_secs),
            reconnect_delay: Duration::from_secs(self.cloud.reconnect_delay_secs),
            user_id: self.user_id.clone(),
        })
    }

    pub fn executor_timeout(&self) -> Duration {
        Duration::from_secs(self.executor.timeout_secs)
    }

    /// Configured executor socket, or the per-user default.
    pub fn executor_socket(&self) -> PathBuf {
        self.executor.socket.clone().unwrap_or_else(default_socket_path)
    }
}

fn validate_ws_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "invalid {} '{}': must start with ws:// or wss://",
            field, url
        )))
    }
}

/// Default config location: `$TM_CONFIG`, else `<config dir>/taskmate/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    if let Some(path) = env::config_path() {
        return Some(path);
    }
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Default executor socket: `<runtime dir>/taskmate/executor.sock`.
pub fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(SOCKET_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
