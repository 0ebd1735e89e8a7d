// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tm_core::Envelope;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use super::error::{SyncError, SyncResult};
use super::executor::{BoxFuture, CommandExecutor};

/// How long helpers wait for traffic before failing the test.
pub const TEST_WAIT: Duration = Duration::from_secs(5);

enum Outbound {
    Text(String),
    Close,
}

/// In-process WebSocket backend on a random port.
///
/// Records every text frame the client sends and lets the test push frames
/// or drop the current connection.
pub struct MockServer {
    addr: SocketAddr,
    received: mpsc::UnboundedReceiver<String>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<Outbound>>>>,
    connections: Arc<AtomicUsize>,
    accept_task: JoinHandle<()>,
}

impl MockServer {
    /// Start a new server on a random available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received) = mpsc::unbounded_channel();
        let current = Arc::new(Mutex::new(None));
        let connections = Arc::new(AtomicUsize::new(0));

        let accept_current = Arc::clone(&current);
        let accept_connections = Arc::clone(&connections);
        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };
                let (tx, rx) = mpsc::unbounded_channel();
                *accept_current.lock().unwrap() = Some(tx);
                accept_connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve_connection(ws, rx, received_tx.clone()));
            }
        });

        MockServer {
            addr,
            received,
            current,
            connections,
            accept_task,
        }
    }

    /// Get the WebSocket URL for connecting to this server.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Waits until at least `n` connections have been accepted.
    pub async fn wait_for_connections(&self, n: usize) {
        tokio::time::timeout(TEST_WAIT, async {
            while self.connections() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for a client connection");
    }

    /// Next frame the client sent, parsed as JSON.
    pub async fn next_frame(&mut self) -> Value {
        let text = tokio::time::timeout(TEST_WAIT, self.received.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("server channel closed");
        serde_json::from_str(&text).unwrap()
    }

    /// Asserts the client sends nothing for `within`.
    pub async fn expect_silence(&mut self, within: Duration) {
        if let Ok(Some(text)) = tokio::time::timeout(within, self.received.recv()).await {
            panic!("unexpected client frame: {}", text);
        }
    }

    /// Sends a JSON frame to the connected client.
    pub fn send(&self, value: Value) {
        self.send_raw(&value.to_string());
    }

    /// Sends a raw text frame to the connected client.
    pub fn send_raw(&self, text: &str) {
        let current = self.current.lock().unwrap();
        let tx = current.as_ref().expect("no client connected");
        tx.send(Outbound::Text(text.to_string())).unwrap();
    }

    /// Closes the current connection from the server side.
    pub fn drop_connection(&self) {
        if let Some(tx) = self.current.lock().unwrap().take() {
            let _ = tx.send(Outbound::Close);
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.drop_connection();
    }
}

async fn serve_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    received: mpsc::UnboundedSender<String>,
) {
    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = received.send(text.to_string());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            out = outbound.recv() => match out {
                Some(Outbound::Text(text)) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.close().await;
                    break;
                }
            },
        }
    }
}

/// Command executor that records calls and replies with a fixed envelope.
pub struct RecordingExecutor {
    calls: Mutex<Vec<(String, Value)>>,
    reply: Mutex<Option<Envelope>>,
}

impl RecordingExecutor {
    /// Executor answering every call with `reply`.
    pub fn replying(reply: Envelope) -> Arc<Self> {
        Arc::new(RecordingExecutor {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(Some(reply)),
        })
    }

    /// Executor failing every call with an executor error.
    pub fn failing() -> Arc<Self> {
        Arc::new(RecordingExecutor {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn procedures(&self) -> Vec<String> {
        self.calls().into_iter().map(|(p, _)| p).collect()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn invoke<'a>(&'a self, procedure: &'a str, args: Value) -> BoxFuture<'a, SyncResult<Envelope>> {
        self.calls
            .lock()
            .unwrap()
            .push((procedure.to_string(), args));
        let reply = self.reply.lock().unwrap().clone();
        Box::pin(async move {
            reply.ok_or_else(|| SyncError::Executor("executor unavailable".to_string()))
        })
    }
}
