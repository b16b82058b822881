// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatcher
//!
//! The single sequence that mutates coordination state. Connections hand it
//! one `Inbound` at a time; it routes the request, answers every call that
//! became resolvable, re-arms the accept slot and forwards telemetry.

use std::time::Instant;

use rdv_adapters::TelemetrySink;
use rdv_core::{
    CoordError, CoordinationService, OpKind, Operation, Reply, ResetScope, Resolution,
    TelemetryRecord,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::protocol::{ErrorKind, Request, Response, PROTOCOL_VERSION};
use crate::slots::AcceptSlot;

/// Call handle: answers exactly one request, possibly long after it arrived
#[derive(Debug)]
pub struct PendingCall {
    id: u64,
    reply: oneshot::Sender<Response>,
}

impl PendingCall {
    pub fn new(id: u64) -> (Self, oneshot::Receiver<Response>) {
        let (reply, rx) = oneshot::channel();
        (Self { id, reply }, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Send the response; a caller that went away is not an error
    pub fn respond(self, response: Response) {
        if self.reply.send(response).is_err() {
            debug!(call_id = self.id, "caller gone, response dropped");
        }
    }
}

/// A decoded request on its way to the dispatcher
#[derive(Debug)]
pub struct Inbound {
    pub request: Request,
    pub call: PendingCall,
    pub slot: AcceptSlot,
}

/// What to do when a call violates a coordination precondition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MisusePolicy {
    /// Answer the call with an error and keep serving
    #[default]
    Reject,
    /// Answer the call, then stop the daemon
    Abort,
}

fn error_response(error: &CoordError) -> Response {
    let kind = if error.is_protocol_misuse() {
        ErrorKind::ProtocolMisuse
    } else {
        ErrorKind::Cancelled
    };
    Response::error(kind, error.to_string())
}

fn answer(resolution: Resolution<PendingCall>) {
    let Resolution { handle, outcome } = resolution;
    debug!(call_id = handle.id(), ok = outcome.is_ok(), "resolved");
    let response = match outcome {
        Ok(reply) => Response::Reply { reply },
        Err(e) => error_response(&e),
    };
    handle.respond(response);
}

/// Routes requests into the coordination service and answers the calls
pub struct Dispatcher<T> {
    service: CoordinationService<PendingCall>,
    telemetry: T,
    on_misuse: MisusePolicy,
    start_time: Instant,
    shutdown_requested: bool,
}

impl<T: TelemetrySink> Dispatcher<T> {
    pub fn new(reset_scope: ResetScope, telemetry: T, on_misuse: MisusePolicy) -> Self {
        Self {
            service: CoordinationService::new(reset_scope),
            telemetry,
            on_misuse,
            start_time: Instant::now(),
            shutdown_requested: false,
        }
    }

    /// Handle one inbound request to completion
    ///
    /// The accept slot is always re-armed, whether the call was answered or
    /// parked. Telemetry reaches the sink only after the call is acknowledged.
    pub async fn dispatch(&mut self, inbound: Inbound) {
        let Inbound {
            request,
            call,
            slot,
        } = inbound;
        debug!(call_id = call.id(), kind = %slot.kind(), "dispatching");

        let record = match request {
            Request::Ping => {
                call.respond(Response::Pong);
                None
            }
            Request::Hello { version } => {
                if version != PROTOCOL_VERSION {
                    debug!(client_version = %version, "client protocol differs");
                }
                call.respond(Response::Hello {
                    version: PROTOCOL_VERSION.to_string(),
                });
                None
            }
            Request::Status => {
                call.respond(self.status());
                None
            }
            Request::Shutdown => {
                self.shutdown_requested = true;
                call.respond(Response::ShuttingDown);
                None
            }
            Request::Call { op } => {
                self.apply(op, call);
                None
            }
            Request::Telemetry { record } => {
                call.respond(Response::Reply { reply: Reply::Ack });
                Some(record)
            }
        };

        slot.rearm();

        if let Some(record) = record {
            self.forward(&record).await;
        }
    }

    fn apply(&mut self, op: Operation, call: PendingCall) {
        let kind = op.kind();
        let call_id = call.id();
        match self.service.apply(op, call) {
            Ok(resolutions) => {
                if !resolutions.iter().any(|r| r.handle.id() == call_id) {
                    debug!(call_id, %kind, "parked");
                }
                resolutions.into_iter().for_each(answer);
            }
            Err(rejected) => self.reject(kind, rejected.handle, rejected.error),
        }
    }

    fn reject(&mut self, kind: OpKind, call: PendingCall, error: CoordError) {
        warn!(call_id = call.id(), %kind, error = %error, "protocol misuse");
        call.respond(error_response(&error));

        if self.on_misuse == MisusePolicy::Abort {
            error!(%kind, "aborting on protocol misuse");
            self.shutdown_requested = true;
        }
    }

    async fn forward(&self, record: &TelemetryRecord) {
        if let Err(e) = self.telemetry.record(record).await {
            warn!(error = %e, "telemetry sink failed");
        }
    }

    /// Cancel every parked call; returns how many were answered
    pub fn drain(&mut self, reason: &str) -> usize {
        let resolutions = self.service.drain(reason);
        let count = resolutions.len();
        resolutions.into_iter().for_each(answer);
        count
    }

    pub fn status(&self) -> Response {
        Response::Status {
            uptime_secs: self.start_time.elapsed().as_secs(),
            stats: self.service.stats(),
        }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    pub fn service(&self) -> &CoordinationService<PendingCall> {
        &self.service
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
