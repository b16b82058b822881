// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred responses
//!
//! A waiter is a call that has been accepted but not answered. Registries own
//! waiters in per-name FIFO queues and move them out as resolutions; nothing
//! here knows how a response is actually delivered.

use crate::error::CoordError;
use crate::operation::Reply;

/// An accepted call whose response is withheld until a later event
#[derive(Debug, PartialEq, Eq)]
pub struct Waiter<H> {
    handle: H,
}

impl<H> Waiter<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Answer the waiter
    pub fn resolve(self, reply: Reply) -> Resolution<H> {
        Resolution {
            handle: self.handle,
            outcome: Ok(reply),
        }
    }

    /// Release the waiter without its triggering event
    pub fn cancel(self, reason: &str) -> Resolution<H> {
        Resolution {
            handle: self.handle,
            outcome: Err(CoordError::cancelled(reason)),
        }
    }
}

/// A call handle paired with the answer it must receive
#[derive(Debug, PartialEq)]
pub struct Resolution<H> {
    pub handle: H,
    pub outcome: Result<Reply, CoordError>,
}

/// An operation refused before it touched any state
///
/// The call handle is returned so the caller can still be answered.
#[derive(Debug, PartialEq)]
pub struct Rejected<H> {
    pub handle: H,
    pub error: CoordError,
}

impl<H> Rejected<H> {
    pub fn new(handle: H, error: CoordError) -> Self {
        Self { handle, error }
    }
}

/// Result of applying one operation: the calls to answer now, in order
pub type Step<H> = Result<Vec<Resolution<H>>, Rejected<H>>;
