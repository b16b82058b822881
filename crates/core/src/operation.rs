// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination operations and their replies

use crate::coordination::LockStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single coordination request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Operation {
    /// Join a rendezvous barrier of `count` participants
    Arrive { name: String, count: u32 },
    TryAcquire { name: String },
    SignalDone { name: String },
    AwaitDone { name: String },
    /// `value` is encoded as a JSON array of numbers on the wire
    Publish { key: String, value: Vec<u8> },
    Withdraw { key: String },
    Read { key: String },
    Increase { name: String, delta: i32 },
    Delete { name: String },
    ResetAll,
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Arrive { .. } => OpKind::Arrive,
            Operation::TryAcquire { .. } => OpKind::TryAcquire,
            Operation::SignalDone { .. } => OpKind::SignalDone,
            Operation::AwaitDone { .. } => OpKind::AwaitDone,
            Operation::Publish { .. } => OpKind::Publish,
            Operation::Withdraw { .. } => OpKind::Withdraw,
            Operation::Read { .. } => OpKind::Read,
            Operation::Increase { .. } => OpKind::Increase,
            Operation::Delete { .. } => OpKind::Delete,
            Operation::ResetAll => OpKind::ResetAll,
        }
    }

    /// The barrier, lock, key or counter this operation targets
    pub fn target(&self) -> Option<&str> {
        match self {
            Operation::Arrive { name, .. }
            | Operation::TryAcquire { name }
            | Operation::SignalDone { name }
            | Operation::AwaitDone { name }
            | Operation::Increase { name, .. }
            | Operation::Delete { name } => Some(name),
            Operation::Publish { key, .. } | Operation::Withdraw { key } | Operation::Read { key } => {
                Some(key)
            }
            Operation::ResetAll => None,
        }
    }
}

/// Operation kind, used to route calls and to size transport capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Arrive,
    TryAcquire,
    SignalDone,
    AwaitDone,
    Publish,
    Withdraw,
    Read,
    Increase,
    Delete,
    ResetAll,
}

impl OpKind {
    pub const ALL: [OpKind; 10] = [
        OpKind::Arrive,
        OpKind::TryAcquire,
        OpKind::SignalDone,
        OpKind::AwaitDone,
        OpKind::Publish,
        OpKind::Withdraw,
        OpKind::Read,
        OpKind::Increase,
        OpKind::Delete,
        OpKind::ResetAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Arrive => "arrive",
            OpKind::TryAcquire => "try_acquire",
            OpKind::SignalDone => "signal_done",
            OpKind::AwaitDone => "await_done",
            OpKind::Publish => "publish",
            OpKind::Withdraw => "withdraw",
            OpKind::Read => "read",
            OpKind::Increase => "increase",
            OpKind::Delete => "delete",
            OpKind::ResetAll => "reset_all",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful answer to an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply")]
pub enum Reply {
    /// Plain acknowledgement (barrier release, signal, publish, ...)
    Ack,
    Lock { status: LockStatus },
    Value { value: Vec<u8> },
    Count { value: i32 },
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
