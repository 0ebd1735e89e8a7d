// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions.

use std::path::PathBuf;

/// Environment variable name constants.
pub mod vars {
    /// Path of the configuration file.
    pub const TM_CONFIG: &str = "TM_CONFIG";
    /// Log filter directive for the `tm` binary.
    pub const TM_LOG: &str = "TM_LOG";
}

/// Returns the value of `TM_CONFIG` if set and non-empty.
pub fn config_path() -> Option<PathBuf> {
    std::env::var(vars::TM_CONFIG)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Returns the value of `TM_LOG` if set.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::TM_LOG).ok()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
