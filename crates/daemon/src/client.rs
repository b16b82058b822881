// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client library for the coordination daemon
//!
//! Every call opens its own connection. Blocking operations (`arrive`,
//! `await_done`, `read`) wait as long as the caller allows; everything else
//! uses the IPC timeout.

use std::time::Duration;

use rdv_core::{
    ActEvent, ActIntervalSample, LockStatus, Operation, Reply, ServiceStats, TelemetryRecord,
};
use thiserror::Error;

use crate::endpoint::Endpoint;
use crate::protocol::{self, ErrorKind, ProtocolError, Request, Response, PROTOCOL_VERSION};

/// Env var for the IPC timeout in milliseconds
pub const ENV_TIMEOUT_IPC_MS: &str = "RDV_TIMEOUT_IPC_MS";

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for non-blocking IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms(ENV_TIMEOUT_IPC_MS).unwrap_or(protocol::DEFAULT_TIMEOUT)
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running at {0}")]
    DaemonNotRunning(Endpoint),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{kind}: {message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The daemon answered the call with `kind`
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        matches!(self, ClientError::Rejected { kind: k, .. } if *k == kind)
    }
}

/// Daemon status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub uptime_secs: u64,
    pub stats: ServiceStats,
}

/// Coordination client bound to one endpoint
#[derive(Debug, Clone)]
pub struct CoordClient {
    endpoint: Endpoint,
    ipc_timeout: Duration,
}

impl CoordClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ipc_timeout: timeout_ipc(),
        }
    }

    pub fn with_ipc_timeout(mut self, timeout: Duration) -> Self {
        self.ipc_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send a request and wait up to `read_timeout` for the answer
    ///
    /// `None` waits forever, for calls the daemon may park.
    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Option<Duration>,
    ) -> Result<Response, ClientError> {
        let mut stream = match self.endpoint.connect().await {
            Ok(stream) => stream,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
                ) =>
            {
                return Err(ClientError::DaemonNotRunning(self.endpoint.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        // Encode and send request with write timeout
        let data = protocol::encode(request)?;
        tokio::time::timeout(self.ipc_timeout, protocol::write_message(&mut stream, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        // Read response, bounded only if asked
        let read = protocol::read_message(&mut stream);
        let response_bytes = match read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, read)
                .await
                .map_err(|_| ProtocolError::Timeout)??,
            None => read.await?,
        };

        Ok(protocol::decode(&response_bytes)?)
    }

    /// Send a request and receive a response within the IPC timeout
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, Some(self.ipc_timeout)).await
    }

    async fn call(&self, op: Operation, wait: Option<Duration>) -> Result<Reply, ClientError> {
        match self.send_with_timeout(&Request::Call { op }, wait).await? {
            Response::Reply { reply } => Ok(reply),
            Response::Error { kind, message } => Err(ClientError::Rejected { kind, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    async fn call_ack(&self, op: Operation, wait: Option<Duration>) -> Result<(), ClientError> {
        match self.call(op, wait).await? {
            Reply::Ack => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    async fn expect_response(&self, request: Request, want: Response) -> Result<(), ClientError> {
        match self.send(&request).await? {
            r if r == want => Ok(()),
            Response::Error { kind, message } => Err(ClientError::Rejected { kind, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        self.expect_response(Request::Ping, Response::Pong).await
    }

    /// Get daemon protocol version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            Response::Error { kind, message } => Err(ClientError::Rejected { kind, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn status(&self) -> Result<StatusReport, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, stats } => Ok(StatusReport { uptime_secs, stats }),
            Response::Error { kind, message } => Err(ClientError::Rejected { kind, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.expect_response(Request::Shutdown, Response::ShuttingDown).await
    }

    /// Arrive at a barrier, returning once `count` participants have arrived
    ///
    /// `wait` only bounds how long this client listens. On timeout the call
    /// stays parked in the daemon and still counts toward the quorum. Retry
    /// under a fresh name.
    pub async fn arrive(
        &self,
        name: &str,
        count: u32,
        wait: Option<Duration>,
    ) -> Result<(), ClientError> {
        let op = Operation::Arrive {
            name: name.to_string(),
            count,
        };
        self.call_ack(op, wait).await
    }

    pub async fn try_acquire(&self, name: &str) -> Result<LockStatus, ClientError> {
        let op = Operation::TryAcquire {
            name: name.to_string(),
        };
        match self.call(op, Some(self.ipc_timeout)).await? {
            Reply::Lock { status } => Ok(status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn signal_done(&self, name: &str) -> Result<(), ClientError> {
        let op = Operation::SignalDone {
            name: name.to_string(),
        };
        self.call_ack(op, Some(self.ipc_timeout)).await
    }

    /// Wait until the lock holder signals done
    ///
    /// `wait` only bounds how long this client listens. On timeout the call
    /// stays parked in the daemon until the holder signals done. Retry under a
    /// fresh name.
    pub async fn await_done(&self, name: &str, wait: Option<Duration>) -> Result<(), ClientError> {
        let op = Operation::AwaitDone {
            name: name.to_string(),
        };
        self.call_ack(op, wait).await
    }

    pub async fn publish(&self, key: &str, value: &[u8]) -> Result<(), ClientError> {
        let op = Operation::Publish {
            key: key.to_string(),
            value: value.to_vec(),
        };
        self.call_ack(op, Some(self.ipc_timeout)).await
    }

    pub async fn withdraw(&self, key: &str) -> Result<(), ClientError> {
        let op = Operation::Withdraw {
            key: key.to_string(),
        };
        self.call_ack(op, Some(self.ipc_timeout)).await
    }

    /// Read a key, waiting for it to be published
    ///
    /// `wait` only bounds how long this client listens. On timeout the call
    /// stays parked in the daemon, and `reset_all` is refused while it
    /// is pending. Retry under a fresh name.
    pub async fn read(&self, key: &str, wait: Option<Duration>) -> Result<Vec<u8>, ClientError> {
        let op = Operation::Read {
            key: key.to_string(),
        };
        match self.call(op, wait).await? {
            Reply::Value { value } => Ok(value),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn increase(&self, name: &str, delta: i32) -> Result<i32, ClientError> {
        let op = Operation::Increase {
            name: name.to_string(),
            delta,
        };
        match self.call(op, Some(self.ipc_timeout)).await? {
            Reply::Count { value } => Ok(value),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn delete_counter(&self, name: &str) -> Result<(), ClientError> {
        let op = Operation::Delete {
            name: name.to_string(),
        };
        self.call_ack(op, Some(self.ipc_timeout)).await
    }

    pub async fn reset_all(&self) -> Result<(), ClientError> {
        self.call_ack(Operation::ResetAll, Some(self.ipc_timeout)).await
    }

    async fn push(&self, record: TelemetryRecord) -> Result<(), ClientError> {
        self.expect_response(
            Request::Telemetry { record },
            Response::Reply { reply: Reply::Ack },
        )
        .await
    }

    pub async fn push_act_event(&self, event: ActEvent) -> Result<(), ClientError> {
        self.push(TelemetryRecord::ActEvent(event)).await
    }

    pub async fn push_act_interval(
        &self,
        actor_id: i64,
        avg_act_interval: f64,
    ) -> Result<(), ClientError> {
        self.push(TelemetryRecord::ActInterval(ActIntervalSample {
            actor_id,
            avg_act_interval,
        }))
        .await
    }
}
