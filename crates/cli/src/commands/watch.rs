// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use futures_util::StreamExt;
use tracing::info;

use crate::error::{Error, Result};
use crate::sync::EventStream;

use super::Context;

/// Prints one compact JSON line per event until `count` events or Ctrl-C.
pub async fn run<W: Write>(
    ctx: &Context,
    event: &str,
    cloud: bool,
    count: Option<usize>,
    out: &mut W,
) -> Result<()> {
    let stream = match (cloud, &ctx.cloud) {
        (true, Some(channel)) => channel.on_event(event),
        (true, None) => {
            return Err(Error::InvalidConfig(
                "watch --cloud needs cloud.url".to_string(),
            ))
        }
        (false, _) => ctx.local.on_event(event),
    };
    info!(event, cloud, "watching");

    tokio::select! {
        result = print_events(stream, count, out) => result,
        _ = tokio::signal::ctrl_c() => Ok(()),
    }
}

async fn print_events<W: Write>(
    mut stream: EventStream,
    count: Option<usize>,
    out: &mut W,
) -> Result<()> {
    let mut seen = 0;
    while count.map_or(true, |limit| seen < limit) {
        let Some(payload) = stream.next().await else {
            break;
        };
        serde_json::to_writer(&mut *out, &payload)?;
        writeln!(out)?;
        out.flush()?;
        seen += 1;
    }
    Ok(())
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
