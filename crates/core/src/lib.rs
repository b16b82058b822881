// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdv-core: coordination state machines for the rdv control plane
//!
//! This crate provides:
//! - Barrier, completion-lock, key-value and counter registries keyed by name
//! - `CoordinationService`, the routing function a dispatcher drives
//! - Waiter and resolution values for deferred responses
//! - Telemetry record types passed through to external sinks

pub mod coordination;
pub mod error;
pub mod operation;
pub mod telemetry;
pub mod waiter;

// Re-exports
pub use coordination::{
    CoordinationService, LockState, LockStatus, ResetScope, ServiceStats,
};
pub use error::CoordError;
pub use operation::{OpKind, Operation, Reply};
pub use telemetry::{ActEvent, ActIntervalSample, TelemetryRecord};
pub use waiter::{Rejected, Resolution, Step, Waiter};
