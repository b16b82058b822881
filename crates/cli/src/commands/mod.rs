// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod barrier;
pub mod counter;
pub mod daemon;
pub mod kv;
pub mod lock;

use std::time::Duration;

/// Optional wait for blocking calls; absent means wait forever
pub(crate) fn wait_limit(timeout_ms: Option<u64>) -> Option<Duration> {
    timeout_ms.map(Duration::from_millis)
}
