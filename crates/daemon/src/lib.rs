// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdv coordination daemon
//!
//! Wire protocol, transport, dispatcher and lifecycle for the coordination
//! service, plus the client library that speaks to it.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod lifecycle;
pub mod protocol;
pub mod server;
pub mod slots;

pub use client::{ClientError, CoordClient, StatusReport};
pub use config::Config;
pub use dispatch::{Dispatcher, MisusePolicy};
pub use endpoint::Endpoint;
pub use lifecycle::{startup, DaemonState, LifecycleError};
pub use protocol::{ErrorKind, Request, Response, MAX_VALUE_SIZE, PROTOCOL_VERSION};
