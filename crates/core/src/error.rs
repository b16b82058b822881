// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for coordination operations
//!
//! Every variant except `Cancelled` is a protocol misuse: the caller broke a
//! documented precondition and the distributed protocol above this layer is
//! already inconsistent.

use thiserror::Error;

/// Errors produced by the coordination registries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    // ========== Barrier ==========
    /// Barrier declared with zero participants
    #[error("barrier {name}: expected count must be positive")]
    InvalidBarrierCount { name: String },

    /// Arrival disagrees with the count declared by the first arrival
    #[error("barrier {name}: expected count {got} does not match {expected}")]
    BarrierCountMismatch {
        name: String,
        expected: u32,
        got: u32,
    },

    // ========== Lock ==========
    /// Completion signalled on a lock nobody acquired
    #[error("lock {name}: signal-done on a lock that was never acquired")]
    LockUnset { name: String },

    /// Completion signalled twice
    #[error("lock {name}: already signalled done")]
    LockAlreadyDone { name: String },

    /// Wait on a lock nobody acquired
    #[error("lock {name}: await-done on a lock that was never acquired")]
    AwaitOnUnsetLock { name: String },

    // ========== Key-value ==========
    #[error("key {key}: already published")]
    DuplicateKey { key: String },

    #[error("key {key}: not published")]
    KeyNotPublished { key: String },

    /// Withdraw while readers are still parked on the key
    #[error("key {key}: {count} read(s) still pending")]
    PendingReads { key: String, count: usize },

    // ========== Counter ==========
    #[error("counter {name}: not found")]
    CounterNotFound { name: String },

    // ========== Reset ==========
    #[error("reset refused: {count} read(s) still pending")]
    ResetWithPendingReads { count: usize },

    // ========== Resolution ==========
    /// A parked call was released without its triggering event
    #[error("cancelled: {reason}")]
    Cancelled { reason: String },
}

impl CoordError {
    /// Returns true if the caller violated a protocol precondition
    pub fn is_protocol_misuse(&self) -> bool {
        !matches!(self, CoordError::Cancelled { .. })
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        CoordError::Cancelled {
            reason: reason.into(),
        }
    }
}
