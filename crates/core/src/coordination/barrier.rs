// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendezvous barriers
//!
//! A barrier exists only while it has parked arrivals. It is created by the
//! first arrival and removed the instant the declared quorum is reached.

use crate::error::CoordError;
use crate::operation::Reply;
use crate::waiter::{Rejected, Step, Waiter};
use std::collections::HashMap;

/// An in-flight barrier
#[derive(Debug)]
pub struct Barrier<H> {
    expected: u32,
    arrived: Vec<Waiter<H>>,
}

impl<H> Barrier<H> {
    fn new(expected: u32) -> Self {
        Self {
            expected,
            arrived: Vec::new(),
        }
    }

    pub fn expected(&self) -> u32 {
        self.expected
    }

    pub fn arrived(&self) -> usize {
        self.arrived.len()
    }
}

/// Barriers keyed by name
#[derive(Debug)]
pub struct BarrierRegistry<H> {
    barriers: HashMap<String, Barrier<H>>,
}

impl<H> Default for BarrierRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> BarrierRegistry<H> {
    pub fn new() -> Self {
        Self {
            barriers: HashMap::new(),
        }
    }

    /// Register an arrival, releasing everyone once `expected` have arrived
    pub fn arrive(&mut self, name: &str, expected: u32, handle: H) -> Step<H> {
        if expected == 0 {
            return Err(Rejected::new(
                handle,
                CoordError::InvalidBarrierCount {
                    name: name.to_string(),
                },
            ));
        }

        let barrier = self
            .barriers
            .entry(name.to_string())
            .or_insert_with(|| Barrier::new(expected));

        if barrier.expected != expected {
            return Err(Rejected::new(
                handle,
                CoordError::BarrierCountMismatch {
                    name: name.to_string(),
                    expected: barrier.expected,
                    got: expected,
                },
            ));
        }

        barrier.arrived.push(Waiter::new(handle));
        if barrier.arrived.len() < expected as usize {
            return Ok(Vec::new());
        }

        let released = self
            .barriers
            .remove(name)
            .map(|b| b.arrived)
            .unwrap_or_default();

        tracing::debug!(barrier = name, count = released.len(), "barrier released");

        Ok(released
            .into_iter()
            .map(|waiter| waiter.resolve(Reply::Ack))
            .collect())
    }

    pub fn get(&self, name: &str) -> Option<&Barrier<H>> {
        self.barriers.get(name)
    }

    /// Number of barriers still waiting for their quorum
    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }

    /// Total arrivals parked across all barriers
    pub fn parked(&self) -> usize {
        self.barriers.values().map(|b| b.arrived.len()).sum()
    }

    /// Remove every barrier, handing back the parked arrivals
    pub fn drain(&mut self) -> Vec<Waiter<H>> {
        self.barriers
            .drain()
            .flat_map(|(_, barrier)| barrier.arrived)
            .collect()
    }
}

#[cfg(test)]
#[path = "barrier_tests.rs"]
mod tests;
