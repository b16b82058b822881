// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination registries
//!
//! This module provides:
//! - **Barrier** - Rendezvous released once a declared quorum arrives
//! - **Lock** - Completion lock: one winner does the work, others wait for it
//! - **KvStore** - Publish/read exchange where reads block until publish
//! - **CounterTable** - Named 32-bit counters
//! - **CoordinationService** - Routes operations to the registries

pub mod barrier;
pub mod counter;
pub mod kv;
pub mod lock;
pub mod reset;
pub mod service;

pub use barrier::{Barrier, BarrierRegistry};
pub use counter::CounterTable;
pub use kv::KvStore;
pub use lock::{LockRegistry, LockState, LockStatus};
pub use reset::ResetScope;
pub use service::{CoordinationService, ServiceStats};
