// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion locks
//!
//! One caller wins `try_acquire` and is responsible for the work; everyone
//! else polls with `try_acquire` or parks on `await_done` until the winner
//! calls `signal_done`. A name with no entry is unset.

use crate::error::CoordError;
use crate::operation::Reply;
use crate::waiter::{Rejected, Step, Waiter};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Answer to a try-acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStatus {
    /// The caller won the lock and owns the work
    Locked,
    /// Someone else holds the lock and has not signalled completion
    InProgress,
    /// The work has completed
    Done,
}

/// State of an acquired lock
#[derive(Debug)]
pub enum LockState<H> {
    /// Held; callers awaiting completion are parked here in arrival order
    Active { waiters: VecDeque<Waiter<H>> },
    /// Completion signalled; sticky until reset
    Done,
}

impl<H> LockState<H> {
    pub fn status(&self) -> LockStatus {
        match self {
            LockState::Active { .. } => LockStatus::InProgress,
            LockState::Done => LockStatus::Done,
        }
    }
}

/// Completion locks keyed by name
#[derive(Debug)]
pub struct LockRegistry<H> {
    locks: HashMap<String, LockState<H>>,
}

impl<H> Default for LockRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> LockRegistry<H> {
    pub fn new() -> Self {
        Self {
            locks: HashMap::new(),
        }
    }

    /// Only the first call for a name returns `Locked`
    pub fn try_acquire(&mut self, name: &str, handle: H) -> Step<H> {
        let status = match self.locks.get(name) {
            None => {
                self.locks.insert(
                    name.to_string(),
                    LockState::Active {
                        waiters: VecDeque::new(),
                    },
                );
                tracing::debug!(lock = name, "lock acquired");
                LockStatus::Locked
            }
            Some(state) => state.status(),
        };

        Ok(vec![Waiter::new(handle).resolve(Reply::Lock { status })])
    }

    /// Mark the lock done, releasing every parked waiter before the caller
    pub fn signal_done(&mut self, name: &str, handle: H) -> Step<H> {
        let state = match self.locks.get_mut(name) {
            None => {
                return Err(Rejected::new(
                    handle,
                    CoordError::LockUnset {
                        name: name.to_string(),
                    },
                ))
            }
            Some(LockState::Done) => {
                return Err(Rejected::new(
                    handle,
                    CoordError::LockAlreadyDone {
                        name: name.to_string(),
                    },
                ))
            }
            Some(state) => state,
        };

        let mut resolutions = Vec::new();
        if let LockState::Active { waiters } = std::mem::replace(state, LockState::Done) {
            tracing::debug!(lock = name, waiters = waiters.len(), "lock done");
            resolutions.extend(waiters.into_iter().map(|w| w.resolve(Reply::Ack)));
        }
        resolutions.push(Waiter::new(handle).resolve(Reply::Ack));

        Ok(resolutions)
    }

    /// Park until the lock is done, or answer at once if it already is
    pub fn await_done(&mut self, name: &str, handle: H) -> Step<H> {
        match self.locks.get_mut(name) {
            None => Err(Rejected::new(
                handle,
                CoordError::AwaitOnUnsetLock {
                    name: name.to_string(),
                },
            )),
            Some(LockState::Active { waiters }) => {
                waiters.push_back(Waiter::new(handle));
                Ok(Vec::new())
            }
            Some(LockState::Done) => Ok(vec![Waiter::new(handle).resolve(Reply::Ack)]),
        }
    }

    pub fn get(&self, name: &str) -> Option<&LockState<H>> {
        self.locks.get(name)
    }

    pub fn status(&self, name: &str) -> Option<LockStatus> {
        self.locks.get(name).map(LockState::status)
    }

    pub fn active_count(&self) -> usize {
        self.locks
            .values()
            .filter(|s| matches!(s, LockState::Active { .. }))
            .count()
    }

    pub fn done_count(&self) -> usize {
        self.locks
            .values()
            .filter(|s| matches!(s, LockState::Done))
            .count()
    }

    /// Callers parked on `await_done` across all locks
    pub fn waiter_count(&self) -> usize {
        self.locks
            .values()
            .map(|s| match s {
                LockState::Active { waiters } => waiters.len(),
                LockState::Done => 0,
            })
            .sum()
    }

    /// Forget every lock, handing back waiters that will never see completion
    pub fn clear(&mut self) -> Vec<Waiter<H>> {
        self.locks
            .drain()
            .flat_map(|(_, state)| match state {
                LockState::Active { waiters } => waiters.into_iter().collect::<Vec<_>>(),
                LockState::Done => Vec::new(),
            })
            .collect()
    }

    /// Take parked waiters out without changing lock states
    pub fn drain_waiters(&mut self) -> Vec<Waiter<H>> {
        self.locks
            .values_mut()
            .flat_map(|state| match state {
                LockState::Active { waiters } => waiters.drain(..).collect::<Vec<_>>(),
                LockState::Done => Vec::new(),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
