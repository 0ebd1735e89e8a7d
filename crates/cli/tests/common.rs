// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use tm_ipc::{framing, Envelope, ProcedureCall};

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Nothing listens here, so the local channel never connects.
pub const UNREACHABLE_URL: &str = "ws://127.0.0.1:9";

pub fn tm() -> Command {
    cargo_bin_cmd!("tm")
}

/// Temp directory holding a config file and an executor socket path.
pub struct Fixture {
    pub temp: TempDir,
}

impl Fixture {
    /// Config with an unreachable local backend and no cloud backend.
    pub fn offline() -> Self {
        Fixture::with_extra("")
    }

    /// Offline config with `extra` TOML appended.
    pub fn with_extra(extra: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("executor.sock");
        let config = format!(
            "[local]\nurl = \"{}\"\n\n[executor]\nsocket = \"{}\"\ntimeout_secs = 2\n{}",
            UNREACHABLE_URL,
            socket.display(),
            extra
        );
        std::fs::write(temp.path().join("config.toml"), config).unwrap();
        Fixture { temp }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.temp.path().join("executor.sock")
    }

    /// `tm --config <fixture> --wait 0`.
    pub fn tm(&self) -> Command {
        let mut cmd = tm();
        cmd.arg("--config")
            .arg(self.config_path())
            .arg("--wait")
            .arg("0")
            .env_remove("TM_CONFIG");
        cmd
    }
}

/// Answers `calls` command executor connections on `socket` with `reply`
/// and returns the calls it received.
pub fn serve_executor(socket: &Path, reply: Envelope, calls: usize) -> JoinHandle<Vec<ProcedureCall>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let listener = runtime.block_on(async { tokio::net::UnixListener::bind(socket).unwrap() });
    std::thread::spawn(move || {
        runtime.block_on(async move {
            let mut received = Vec::new();
            for _ in 0..calls {
                let (mut stream, _) = listener.accept().await.unwrap();
                received.push(framing::read_call(&mut stream).await.unwrap());
                framing::write_reply(&mut stream, &reply).await.unwrap();
            }
            received
        })
    })
}
