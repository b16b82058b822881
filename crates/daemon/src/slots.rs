// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-kind accept capacity
//!
//! Each request kind may have at most `capacity` calls in flight between the
//! transport and the dispatcher. A connection takes a slot before handing a
//! call over; the dispatcher re-arms the slot once the call is answered or
//! parked, so parked calls never hold capacity.

use std::collections::HashMap;
use std::sync::Arc;

use rdv_core::OpKind;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::protocol::CallKind;

#[derive(Debug, thiserror::Error)]
#[error("accept slots closed")]
pub struct SlotsClosed;

/// Semaphores bounding concurrent accepts, one per call kind
#[derive(Debug)]
pub struct AcceptSlots {
    capacity: usize,
    kinds: HashMap<CallKind, Arc<Semaphore>>,
}

impl AcceptSlots {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let kinds = OpKind::ALL
            .iter()
            .map(|&kind| CallKind::Op(kind))
            .chain([CallKind::Control, CallKind::Telemetry])
            .map(|kind| (kind, Arc::new(Semaphore::new(capacity))))
            .collect();
        Self { capacity, kinds }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait for a free slot of `kind`
    pub async fn acquire(&self, kind: CallKind) -> Result<AcceptSlot, SlotsClosed> {
        let semaphore = self.kinds.get(&kind).ok_or(SlotsClosed)?;
        let permit = Arc::clone(semaphore)
            .acquire_owned()
            .await
            .map_err(|_| SlotsClosed)?;
        Ok(AcceptSlot { kind, permit })
    }

    /// Free slots of `kind`
    pub fn available(&self, kind: CallKind) -> usize {
        self.kinds
            .get(&kind)
            .map(|s| s.available_permits())
            .unwrap_or(0)
    }

    /// Stop handing out slots; waiting acquirers fail
    pub fn close(&self) {
        for semaphore in self.kinds.values() {
            semaphore.close();
        }
    }
}

/// One unit of accept capacity, held until the dispatcher re-arms it
#[derive(Debug)]
pub struct AcceptSlot {
    kind: CallKind,
    permit: OwnedSemaphorePermit,
}

impl AcceptSlot {
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Release the slot so the transport can accept the next call of this kind
    pub fn rearm(self) {
        tracing::trace!(kind = %self.kind, "re-armed");
        drop(self.permit);
    }
}

#[cfg(test)]
#[path = "slots_tests.rs"]
mod tests;
