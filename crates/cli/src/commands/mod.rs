// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod entity;
pub mod status;
pub mod sync;
pub mod watch;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tm_core::SyncMetadata;
use tracing::debug;

use crate::cli::Command;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{
    ChannelState, CloudChannel, CommandExecutor, IpcExecutor, LocalChannel, LogSink,
    SyncGateway, SyncOrchestrator,
};

/// Running transports and the services built on them.
pub struct Context {
    pub local: Arc<LocalChannel>,
    pub cloud: Option<Arc<CloudChannel>>,
    pub gateway: Arc<SyncGateway>,
    pub orchestrator: SyncOrchestrator,
    pub executor_socket: PathBuf,
}

impl Context {
    /// Starts every configured channel and waits up to `wait` for them to connect.
    ///
    /// Routing never blocks on a connection; the wait only gives freshly
    /// started channels a chance to come up before the first call.
    pub async fn start(config: &Config, wait: Duration) -> Result<Self> {
        let executor_socket = config.executor_socket();
        let executor: Arc<dyn CommandExecutor> = Arc::new(
            IpcExecutor::new(executor_socket.clone()).with_timeout(config.executor_timeout()),
        );

        let local = Arc::new(LocalChannel::new(config.local_channel()));
        local.connect();
        let cloud = config
            .cloud_channel()
            .map(|c| Arc::new(CloudChannel::new(c, Arc::clone(&executor))));
        if let Some(cloud) = &cloud {
            cloud.connect();
        }

        if !wait.is_zero() {
            let cloud_ready = async {
                match &cloud {
                    Some(cloud) => {
                        cloud
                            .state_handle()
                            .wait_for(ChannelState::Connected, wait)
                            .await
                    }
                    None => false,
                }
            };
            let (local_up, cloud_up) = tokio::join!(
                local.state_handle().wait_for(ChannelState::Connected, wait),
                cloud_ready
            );
            debug!(local_up, cloud_up, "connection grace period over");
        }

        let mut gateway = SyncGateway::new(local.clone(), Arc::clone(&executor))
            .with_entities(config.entities()?);
        if let Some(cloud) = &cloud {
            gateway = gateway.with_cloud(cloud.clone());
        }
        let gateway = Arc::new(gateway);
        let orchestrator = SyncOrchestrator::new(gateway.clone(), Arc::new(LogSink));

        Ok(Context {
            local,
            cloud,
            gateway,
            orchestrator,
            executor_socket,
        })
    }

    /// Closes every channel.
    pub fn shutdown(&self) {
        self.local.close();
        if let Some(cloud) = &self.cloud {
            cloud.close();
        }
    }
}

/// Runs one CLI command, writing its output to `out`.
pub async fn run<W: Write>(
    ctx: &Context,
    command: Command,
    meta: SyncMetadata,
    out: &mut W,
) -> Result<()> {
    let gateway = ctx.gateway.as_ref();
    match command {
        Command::List { entity, filter } => {
            let records = entity::list(gateway, &entity, filter, meta).await?;
            print_json(out, &records)
        }
        Command::Get { entity, id } => {
            let record = entity::get(gateway, &entity, &id, meta).await?;
            print_json(out, &record)
        }
        Command::Create { entity, data } => {
            let record = entity::create(gateway, &entity, &data, meta).await?;
            print_json(out, &record)
        }
        Command::Update { entity, id, data } => {
            let record = entity::update(gateway, &entity, &id, &data, meta).await?;
            print_json(out, &record)
        }
        Command::UpdateAll { entity, data } => {
            let result = entity::update_all(gateway, &entity, &data, meta).await?;
            print_json(out, &result)
        }
        Command::Delete { entity, id } => {
            let result = entity::delete(gateway, &entity, &id, meta).await?;
            print_json(out, &result)
        }
        Command::Sync { mode } => {
            let envelope = sync::run(&ctx.orchestrator, mode).await?;
            print_json(out, &envelope)
        }
        Command::Visibility { from, to } => {
            let report = sync::visibility(&ctx.orchestrator, from, to).await;
            print_json(out, &report)
        }
        Command::Watch {
            event,
            cloud,
            count,
        } => watch::run(ctx, &event, cloud, count, out).await,
        Command::Status => print_json(out, &status::report(ctx)),
    }
}

/// Writes a value as pretty JSON followed by a newline.
pub fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
