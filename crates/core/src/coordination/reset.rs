// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Which registries a global reset clears

use serde::{Deserialize, Serialize};

/// Registries cleared by `ResetAll`
///
/// Defaults to locks and key-value entries. Barriers and counters are usually
/// scoped to a session and managed by their users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetScope {
    pub locks: bool,
    pub kv: bool,
    pub barriers: bool,
    pub counters: bool,
}

impl Default for ResetScope {
    fn default() -> Self {
        Self {
            locks: true,
            kv: true,
            barriers: false,
            counters: false,
        }
    }
}

impl ResetScope {
    /// Clear every registry
    pub fn all() -> Self {
        Self {
            locks: true,
            kv: true,
            barriers: true,
            counters: true,
        }
    }

    pub fn with_barriers(mut self, enabled: bool) -> Self {
        self.barriers = enabled;
        self
    }

    pub fn with_counters(mut self, enabled: bool) -> Self {
        self.counters = enabled;
        self
    }
}
