// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared IPC protocol for the command executor.
//!
//! The command executor is a local privileged process that serves named
//! procedures (`todoGetAll`, `syncExport`, ...). Each connection carries one
//! [`ProcedureCall`] and one [`Envelope`] reply, serialized as JSON with
//! length-prefixed framing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use tm_core::{Envelope, ResponseStatus};

/// Request sent to the command executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcedureCall {
    /// Procedure name, e.g. `todoGetAll`.
    pub procedure: String,
    /// Procedure arguments (`{filter|id|data, syncMetadata}`).
    #[serde(default)]
    pub args: Value,
}

impl ProcedureCall {
    pub fn new(procedure: impl Into<String>, args: Value) -> Self {
        ProcedureCall {
            procedure: procedure.into(),
            args,
        }
    }
}

/// Length-prefixed framing utilities.
pub mod framing {
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

    use super::{Envelope, ProcedureCall};

    /// Maximum message size (1MB) to prevent malformed messages from causing hangs.
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    /// Write a serializable message to the given writer.
    pub async fn write_message<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
        T: Serialize,
    {
        let json = serde_json::to_vec(message)
            .map_err(|e| std::io::Error::other(format!("serialize error: {}", e)))?;
        if json.len() > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::other(format!(
                "message too large: {} bytes (max {})",
                json.len(),
                MAX_MESSAGE_SIZE
            )));
        }
        let len =
            u32::try_from(json.len()).map_err(|_| std::io::Error::other("message too large"))?;
        writer.write_all(&len.to_be_bytes()).await?;
        writer.write_all(&json).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read a deserializable message from the given reader.
    pub async fn read_message<R, T>(reader: &mut R) -> std::io::Result<T>
    where
        R: AsyncRead + Unpin,
        T: DeserializeOwned,
    {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await?;
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::other(format!(
                "message too large: {} bytes (max {})",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await?;

        serde_json::from_slice(&buf)
            .map_err(|e| std::io::Error::other(format!("deserialize error: {}", e)))
    }

    /// Write a procedure call.
    pub async fn write_call<W: AsyncWrite + Unpin>(
        writer: &mut W,
        call: &ProcedureCall,
    ) -> std::io::Result<()> {
        write_message(writer, call).await
    }

    /// Read a procedure call.
    pub async fn read_call<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<ProcedureCall> {
        read_message(reader).await
    }

    /// Write a reply envelope.
    pub async fn write_reply<W: AsyncWrite + Unpin>(
        writer: &mut W,
        reply: &Envelope,
    ) -> std::io::Result<()> {
        write_message(writer, reply).await
    }

    /// Read a reply envelope.
    pub async fn read_reply<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Envelope> {
        read_message(reader).await
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
