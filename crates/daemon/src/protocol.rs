// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between clients and the daemon
//!
//! Each message is a 4-byte big-endian length prefix followed by a JSON body.
//! A connection carries one request at a time; the response may be withheld
//! for as long as the operation stays parked.

use std::time::Duration;

use rdv_core::{OpKind, Operation, Reply, ServiceStats, TelemetryRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Protocol version exchanged in `Hello`
pub const PROTOCOL_VERSION: &str = "1";

/// Default timeout for non-blocking IPC round-trips
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest accepted message body
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Largest published value guaranteed to fit in one frame
///
/// Values travel as JSON arrays of numbers, up to four body bytes per value
/// byte. The remaining 64 KiB covers the key and the envelope.
pub const MAX_VALUE_SIZE: usize = (MAX_MESSAGE_SIZE - 64 * 1024) / 4;

/// Client request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Liveness probe
    Ping,
    /// Version handshake
    Hello { version: String },
    /// Daemon uptime and registry occupancy
    Status,
    /// Stop the daemon, cancelling every parked call
    Shutdown,
    /// A coordination operation
    Call { op: Operation },
    /// A telemetry record to forward to the sink
    Telemetry { record: TelemetryRecord },
}

/// Accept-capacity class of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Control,
    Op(OpKind),
    Telemetry,
}

impl Request {
    pub fn kind(&self) -> CallKind {
        match self {
            Request::Ping | Request::Hello { .. } | Request::Status | Request::Shutdown => {
                CallKind::Control
            }
            Request::Call { op } => CallKind::Op(op.kind()),
            Request::Telemetry { .. } => CallKind::Telemetry,
        }
    }
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallKind::Control => f.write_str("control"),
            CallKind::Op(kind) => write!(f, "{}", kind),
            CallKind::Telemetry => f.write_str("telemetry"),
        }
    }
}

/// Why a call was answered with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The operation violated a coordination precondition
    ProtocolMisuse,
    /// A parked call was released without its event (reset or shutdown)
    Cancelled,
    /// The request could not be decoded
    BadRequest,
    /// The daemon is shutting down
    Unavailable,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::ProtocolMisuse => "protocol misuse",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::BadRequest => "bad request",
            ErrorKind::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Daemon response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Hello {
        version: String,
    },
    Status {
        uptime_secs: u64,
        stats: ServiceStats,
    },
    ShuttingDown,
    Reply {
        reply: Reply,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Encode a message as JSON (no length prefix)
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(msg)?)
}

/// Decode a JSON message body
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed message body
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }

    let size = u32::from_be_bytes(len_buf) as usize;
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut body = vec![0u8; size];
    match reader.read_exact(&mut body).await {
        Ok(_) => Ok(body),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => Err(e.into()),
    }
}

/// Write one message body with its length prefix
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode a request, giving up after `timeout`
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Encode and write a response, giving up after `timeout`
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
