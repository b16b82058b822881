// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking key-value exchange
//!
//! Reads of an unpublished key park until the key is published. A key with
//! parked readers is never published, so withdraw always finds the queue
//! empty; the check in `withdraw` is a consistency assertion.

use crate::error::CoordError;
use crate::operation::Reply;
use crate::waiter::{Rejected, Step, Waiter};
use std::collections::{HashMap, VecDeque};

/// Published values and readers waiting for unpublished keys
#[derive(Debug)]
pub struct KvStore<H> {
    entries: HashMap<String, Vec<u8>>,
    pending: HashMap<String, VecDeque<Waiter<H>>>,
}

impl<H> Default for KvStore<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> KvStore<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Publish a value, delivering it to every parked reader first
    pub fn publish(&mut self, key: &str, value: Vec<u8>, handle: H) -> Step<H> {
        if self.entries.contains_key(key) {
            return Err(Rejected::new(
                handle,
                CoordError::DuplicateKey {
                    key: key.to_string(),
                },
            ));
        }

        let mut resolutions = Vec::new();
        if let Some(readers) = self.pending.remove(key) {
            tracing::debug!(key, readers = readers.len(), "delivering to parked readers");
            resolutions.extend(readers.into_iter().map(|reader| {
                reader.resolve(Reply::Value {
                    value: value.clone(),
                })
            }));
        }

        self.entries.insert(key.to_string(), value);
        resolutions.push(Waiter::new(handle).resolve(Reply::Ack));

        Ok(resolutions)
    }

    /// Remove a published value
    ///
    /// Parked reads are checked before publication. A key with parked reads
    /// is never published, so this order is the only one that can report
    /// `PendingReads` instead of folding it into `KeyNotPublished`.
    pub fn withdraw(&mut self, key: &str, handle: H) -> Step<H> {
        let parked = self.pending.get(key).map_or(0, VecDeque::len);
        if parked > 0 {
            return Err(Rejected::new(
                handle,
                CoordError::PendingReads {
                    key: key.to_string(),
                    count: parked,
                },
            ));
        }

        if self.entries.remove(key).is_none() {
            return Err(Rejected::new(
                handle,
                CoordError::KeyNotPublished {
                    key: key.to_string(),
                },
            ));
        }

        Ok(vec![Waiter::new(handle).resolve(Reply::Ack)])
    }

    /// Read a value, parking until it is published
    pub fn read(&mut self, key: &str, handle: H) -> Step<H> {
        if let Some(value) = self.entries.get(key) {
            return Ok(vec![Waiter::new(handle).resolve(Reply::Value {
                value: value.clone(),
            })]);
        }

        self.pending
            .entry(key.to_string())
            .or_default()
            .push_back(Waiter::new(handle));
        Ok(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of published keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Readers parked across all keys
    pub fn pending_reads(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    /// Drop every published value
    ///
    /// Callers must have checked that no reads are pending.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
    }

    /// Take parked readers out, leaving published values in place
    pub fn drain_pending(&mut self) -> Vec<Waiter<H>> {
        self.pending
            .drain()
            .flat_map(|(_, readers)| readers)
            .collect()
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
