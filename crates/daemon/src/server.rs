// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection handling.
//!
//! Each accepted connection runs in its own task and carries one outstanding
//! call at a time. The task takes an accept slot, hands the call to the
//! dispatcher and waits for the answer, which may be held while the call is
//! parked.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatch::{Inbound, PendingCall};
use crate::endpoint::Connection;
use crate::protocol::{self, ErrorKind, ProtocolError, Response};
use crate::slots::AcceptSlots;

/// Everything a connection task needs to reach the dispatcher
#[derive(Clone)]
pub struct ConnectionContext {
    pub inbound: mpsc::Sender<Inbound>,
    pub slots: Arc<AcceptSlots>,
    pub next_call: Arc<AtomicU64>,
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
}

impl ConnectionContext {
    fn next_call_id(&self) -> u64 {
        self.next_call.fetch_add(1, Ordering::Relaxed)
    }
}

/// Serve requests on one connection until the client goes away
pub async fn serve_connection<S>(stream: S, ctx: ConnectionContext) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Send,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    loop {
        let request = match protocol::read_request(&mut reader, ctx.idle_timeout).await {
            Ok(req) => req,
            Err(ProtocolError::ConnectionClosed) => {
                debug!("client disconnected");
                return Ok(());
            }
            Err(ProtocolError::Timeout) => {
                debug!("connection idle, closing");
                return Ok(());
            }
            Err(ProtocolError::Json(e)) => {
                warn!(error = %e, "malformed request");
                let response = Response::error(ErrorKind::BadRequest, e.to_string());
                protocol::write_response(&mut writer, &response, ctx.write_timeout).await?;
                continue;
            }
            Err(e) => return Err(ServerError::Protocol(e)),
        };

        let kind = request.kind();
        let Ok(slot) = ctx.slots.acquire(kind).await else {
            let response = Response::error(ErrorKind::Unavailable, "daemon shutting down");
            protocol::write_response(&mut writer, &response, ctx.write_timeout).await?;
            return Ok(());
        };

        let (call, rx) = PendingCall::new(ctx.next_call_id());
        debug!(call_id = call.id(), %kind, "received");

        let inbound = Inbound {
            request,
            call,
            slot,
        };
        let response = if ctx.inbound.send(inbound).await.is_err() {
            Response::error(ErrorKind::Unavailable, "daemon shutting down")
        } else {
            rx.await.unwrap_or_else(|_| {
                Response::error(ErrorKind::Unavailable, "call dropped by daemon")
            })
        };

        protocol::write_response(&mut writer, &response, ctx.write_timeout).await?;
    }
}

/// Serve an accepted connection on its own task
pub fn spawn_connection(connection: Connection, ctx: ConnectionContext) {
    tokio::spawn(async move {
        if let Err(e) = serve_connection(connection, ctx).await {
            warn!(error = %e, "connection ended with error");
        }
    });
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
