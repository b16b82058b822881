// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination service
//!
//! Owns the four registries and routes each operation to exactly one of them.
//! The service has no interior locking: whoever drives it must apply one
//! operation at a time, which is what gives per-name FIFO ordering.

use super::barrier::BarrierRegistry;
use super::counter::CounterTable;
use super::kv::KvStore;
use super::lock::LockRegistry;
use super::reset::ResetScope;
use crate::error::CoordError;
use crate::operation::{Operation, Reply};
use crate::waiter::{Rejected, Resolution, Step, Waiter};
use serde::{Deserialize, Serialize};

/// Occupancy snapshot of every registry
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub barriers: usize,
    pub parked_arrivals: usize,
    pub locks_active: usize,
    pub locks_done: usize,
    pub await_waiters: usize,
    pub kv_published: usize,
    pub pending_reads: usize,
    pub counters: usize,
}

impl ServiceStats {
    /// Calls currently parked anywhere
    pub fn parked(&self) -> usize {
        self.parked_arrivals + self.await_waiters + self.pending_reads
    }
}

/// Barrier, lock, key-value and counter registries behind one router
#[derive(Debug)]
pub struct CoordinationService<H> {
    barriers: BarrierRegistry<H>,
    locks: LockRegistry<H>,
    kv: KvStore<H>,
    counters: CounterTable,
    reset_scope: ResetScope,
}

impl<H> Default for CoordinationService<H> {
    fn default() -> Self {
        Self::new(ResetScope::default())
    }
}

impl<H> CoordinationService<H> {
    pub fn new(reset_scope: ResetScope) -> Self {
        Self {
            barriers: BarrierRegistry::new(),
            locks: LockRegistry::new(),
            kv: KvStore::new(),
            counters: CounterTable::new(),
            reset_scope,
        }
    }

    /// Apply one operation on behalf of `handle`
    ///
    /// Returns the calls to answer now, in order. The caller's own handle is
    /// among them unless it was parked.
    pub fn apply(&mut self, op: Operation, handle: H) -> Step<H> {
        match op {
            Operation::Arrive { name, count } => self.barriers.arrive(&name, count, handle),
            Operation::TryAcquire { name } => self.locks.try_acquire(&name, handle),
            Operation::SignalDone { name } => self.locks.signal_done(&name, handle),
            Operation::AwaitDone { name } => self.locks.await_done(&name, handle),
            Operation::Publish { key, value } => self.kv.publish(&key, value, handle),
            Operation::Withdraw { key } => self.kv.withdraw(&key, handle),
            Operation::Read { key } => self.kv.read(&key, handle),
            Operation::Increase { name, delta } => {
                let value = self.counters.increase(&name, delta);
                Ok(vec![Waiter::new(handle).resolve(Reply::Count { value })])
            }
            Operation::Delete { name } => match self.counters.delete(&name) {
                Ok(_) => Ok(vec![Waiter::new(handle).resolve(Reply::Ack)]),
                Err(error) => Err(Rejected::new(handle, error)),
            },
            Operation::ResetAll => self.reset_all(handle),
        }
    }

    /// Clear the registries in the reset scope
    ///
    /// Nothing is cleared if a precondition fails. Waiters orphaned by the
    /// reset are cancelled ahead of the caller's acknowledgement.
    fn reset_all(&mut self, handle: H) -> Step<H> {
        let scope = self.reset_scope;

        if scope.kv {
            let count = self.kv.pending_reads();
            if count > 0 {
                return Err(Rejected::new(
                    handle,
                    CoordError::ResetWithPendingReads { count },
                ));
            }
        }

        let mut resolutions = Vec::new();
        if scope.locks {
            resolutions.extend(
                self.locks
                    .clear()
                    .into_iter()
                    .map(|w| w.cancel("lock cleared by reset")),
            );
        }
        if scope.kv {
            self.kv.clear();
        }
        if scope.barriers {
            resolutions.extend(
                self.barriers
                    .drain()
                    .into_iter()
                    .map(|w| w.cancel("barrier cleared by reset")),
            );
        }
        if scope.counters {
            self.counters.clear();
        }

        tracing::info!(
            locks = scope.locks,
            kv = scope.kv,
            barriers = scope.barriers,
            counters = scope.counters,
            cancelled = resolutions.len(),
            "registries reset"
        );

        resolutions.push(Waiter::new(handle).resolve(Reply::Ack));
        Ok(resolutions)
    }

    /// Cancel every parked call, e.g. on server shutdown
    pub fn drain(&mut self, reason: &str) -> Vec<Resolution<H>> {
        let mut waiters = self.barriers.drain();
        waiters.extend(self.locks.drain_waiters());
        waiters.extend(self.kv.drain_pending());
        waiters.into_iter().map(|w| w.cancel(reason)).collect()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            barriers: self.barriers.len(),
            parked_arrivals: self.barriers.parked(),
            locks_active: self.locks.active_count(),
            locks_done: self.locks.done_count(),
            await_waiters: self.locks.waiter_count(),
            kv_published: self.kv.len(),
            pending_reads: self.kv.pending_reads(),
            counters: self.counters.len(),
        }
    }

    pub fn reset_scope(&self) -> ResetScope {
        self.reset_scope
    }

    pub fn barriers(&self) -> &BarrierRegistry<H> {
        &self.barriers
    }

    pub fn locks(&self) -> &LockRegistry<H> {
        &self.locks
    }

    pub fn kv(&self) -> &KvStore<H> {
        &self.kv
    }

    pub fn counters(&self) -> &CounterTable {
        &self.counters
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
