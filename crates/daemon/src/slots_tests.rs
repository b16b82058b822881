// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

const ARRIVE: CallKind = CallKind::Op(OpKind::Arrive);

#[tokio::test]
async fn capacity_is_per_kind() {
    let slots = AcceptSlots::new(1);

    let _arrive = slots.acquire(ARRIVE).await.unwrap();
    assert_eq!(slots.available(ARRIVE), 0);
    assert_eq!(slots.available(CallKind::Op(OpKind::Read)), 1);
    assert_eq!(slots.available(CallKind::Control), 1);
}

#[tokio::test]
async fn rearm_frees_the_slot() {
    let slots = AcceptSlots::new(1);

    let slot = slots.acquire(ARRIVE).await.unwrap();
    let blocked = tokio::time::timeout(Duration::from_millis(20), slots.acquire(ARRIVE)).await;
    assert!(blocked.is_err(), "second acquire should wait");

    slot.rearm();
    let again = tokio::time::timeout(Duration::from_millis(200), slots.acquire(ARRIVE)).await;
    assert!(again.is_ok(), "acquire should succeed after re-arm");
}

#[tokio::test]
async fn close_fails_acquirers() {
    let slots = AcceptSlots::new(2);
    slots.close();
    assert!(slots.acquire(CallKind::Telemetry).await.is_err());
}

#[test]
fn zero_capacity_is_raised_to_one() {
    let slots = AcceptSlots::new(0);
    assert_eq!(slots.capacity(), 1);
    assert_eq!(slots.available(CallKind::Control), 1);
}
