// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named 32-bit counters

use crate::error::CoordError;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CounterTable {
    counters: HashMap<String, i32>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` (which may be negative) and return the new value
    ///
    /// Missing counters start at zero. Overflow wraps.
    pub fn increase(&mut self, name: &str, delta: i32) -> i32 {
        let value = self.counters.entry(name.to_string()).or_insert(0);
        *value = value.wrapping_add(delta);
        *value
    }

    /// Remove a counter, returning its last value
    pub fn delete(&mut self, name: &str) -> Result<i32, CoordError> {
        self.counters
            .remove(name)
            .ok_or_else(|| CoordError::CounterNotFound {
                name: name.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.counters.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
#[path = "counter_tests.rs"]
mod tests;
