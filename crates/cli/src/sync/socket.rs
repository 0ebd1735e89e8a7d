// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised WebSocket link shared by the local and cloud channels.
//!
//! A [`Link`] owns one background task that connects, pumps frames in both
//! directions, and reconnects after a fixed delay whenever the socket drops.
//! Incoming text frames are handed to a [`FrameHandler`] in arrival order;
//! outgoing frames go through an unbounded queue drained by the same task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{SyncError, SyncResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Connected => "connected",
        };
        write!(f, "{}", s)
    }
}

/// Observable connection state.
///
/// Only the link's supervisor task writes it; everything else reads or
/// subscribes.
#[derive(Debug)]
pub struct SharedChannelState {
    tx: watch::Sender<ChannelState>,
}

impl SharedChannelState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ChannelState::Disconnected);
        SharedChannelState { tx }
    }

    pub fn get(&self) -> ChannelState {
        *self.tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ChannelState::Connected
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.tx.subscribe()
    }

    /// Waits until the state equals `target`. Returns false on timeout.
    pub async fn wait_for(&self, target: ChannelState, timeout: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        let reached = async move { rx.wait_for(|s| *s == target).await.is_ok() };
        tokio::time::timeout(timeout, reached).await.unwrap_or(false)
    }

    fn set(&self, state: ChannelState) {
        self.tx.send_replace(state);
    }
}

impl Default for SharedChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives the traffic of a [`Link`].
///
/// Called from the link's task, so implementations must not block.
pub trait FrameHandler: Send + Sync + 'static {
    /// One incoming text frame.
    fn on_frame(&self, text: &str);

    /// The socket just came up.
    fn on_connected(&self) {}

    /// The socket just went down, or a connect attempt failed.
    fn on_disconnected(&self) {}
}

/// Static settings of a link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Channel name used in log lines.
    pub name: &'static str,
    pub url: String,
    /// Fixed pause between a drop and the next connect attempt.
    pub reconnect_delay: Duration,
}

/// A WebSocket connection kept alive by a background task.
pub struct Link {
    config: LinkConfig,
    state: SharedChannelState,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    cancel: CancellationToken,
    started: AtomicBool,
}

impl Link {
    pub fn new(config: LinkConfig) -> Self {
        Link {
            config,
            state: SharedChannelState::new(),
            outbound: Mutex::new(None),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn state(&self) -> &SharedChannelState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Spawns the supervisor task. Later calls are no-ops and return `None`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<H: FrameHandler>(self: &Arc<Self>, handler: Arc<H>) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return None;
        }
        let link = Arc::clone(self);
        Some(tokio::spawn(async move { link.supervise(handler).await }))
    }

    /// Stops the supervisor and closes the socket. The link cannot be restarted.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Queues a text frame on the live connection.
    pub fn send_text(&self, text: String) -> SyncResult<()> {
        let outbound = self.outbound.lock().unwrap_or_else(|e| e.into_inner());
        match outbound.as_ref() {
            Some(tx) => tx
                .send(Message::Text(text.into()))
                .map_err(|_| SyncError::NotConnected),
            None => Err(SyncError::NotConnected),
        }
    }

    async fn supervise<H: FrameHandler>(self: Arc<Self>, handler: Arc<H>) {
        let name = self.config.name;
        loop {
            self.state.set(ChannelState::Connecting);
            debug!(channel = name, url = %self.config.url, "connecting");

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = tokio_tungstenite::connect_async(self.config.url.as_str()) => result,
            };

            match connected {
                Ok((ws, _)) => {
                    info!(channel = name, "connected");
                    self.run_session(ws, handler.as_ref()).await;
                    info!(channel = name, "disconnected");
                }
                Err(e) => {
                    warn!(channel = name, error = %e, "connect failed");
                }
            }

            self.state.set(ChannelState::Disconnected);
            handler.on_disconnected();

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }
        self.state.set(ChannelState::Disconnected);
        debug!(channel = name, "link closed");
    }

    async fn run_session<H: FrameHandler>(&self, ws: WsStream, handler: &H) {
        let name = self.config.name;
        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        *self.outbound.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        self.state.set(ChannelState::Connected);
        handler.on_connected();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                outgoing = rx.recv() => {
                    let Some(msg) = outgoing else { break };
                    if let Err(e) = sink.send(msg).await {
                        warn!(channel = name, error = %e, "send failed");
                        break;
                    }
                }
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => handler.on_frame(text.as_str()),
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(channel = name, error = %e, "receive failed");
                        break;
                    }
                },
            }
        }

        *self.outbound.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
