use super::*;
use crate::coordination::LockStatus;

type Service = CoordinationService<&'static str>;

fn answered(step: Step<&'static str>) -> Vec<(&'static str, Result<Reply, CoordError>)> {
    step.unwrap()
        .into_iter()
        .map(|r| (r.handle, r.outcome))
        .collect()
}

fn arrive(name: &str, count: u32) -> Operation {
    Operation::Arrive {
        name: name.to_string(),
        count,
    }
}

fn lock_op(kind: &str, name: &str) -> Operation {
    let name = name.to_string();
    match kind {
        "try" => Operation::TryAcquire { name },
        "done" => Operation::SignalDone { name },
        _ => Operation::AwaitDone { name },
    }
}

fn publish(key: &str, value: &[u8]) -> Operation {
    Operation::Publish {
        key: key.to_string(),
        value: value.to_vec(),
    }
}

fn read(key: &str) -> Operation {
    Operation::Read {
        key: key.to_string(),
    }
}

fn withdraw(key: &str) -> Operation {
    Operation::Withdraw {
        key: key.to_string(),
    }
}

fn locked(status: LockStatus) -> Result<Reply, CoordError> {
    Ok(Reply::Lock { status })
}

#[test]
fn three_way_barrier_releases_together() {
    let mut service = Service::default();

    assert!(answered(service.apply(arrive("epoch0", 3), "p1")).is_empty());
    assert!(answered(service.apply(arrive("epoch0", 3), "p2")).is_empty());
    let released = answered(service.apply(arrive("epoch0", 3), "p3"));

    assert_eq!(
        released,
        vec![("p1", Ok(Reply::Ack)), ("p2", Ok(Reply::Ack)), ("p3", Ok(Reply::Ack))]
    );
    assert_eq!(service.stats(), ServiceStats::default());
}

#[test]
fn checkpoint_lock_scenario() {
    let mut service = Service::default();

    assert_eq!(
        answered(service.apply(lock_op("try", "ckpt"), "A")),
        vec![("A", locked(LockStatus::Locked))]
    );
    assert_eq!(
        answered(service.apply(lock_op("try", "ckpt"), "B")),
        vec![("B", locked(LockStatus::InProgress))]
    );
    assert!(answered(service.apply(lock_op("await", "ckpt"), "C")).is_empty());

    assert_eq!(
        answered(service.apply(lock_op("done", "ckpt"), "A")),
        vec![("C", Ok(Reply::Ack)), ("A", Ok(Reply::Ack))]
    );
    assert_eq!(
        answered(service.apply(lock_op("try", "ckpt"), "D")),
        vec![("D", locked(LockStatus::Done))]
    );
}

#[test]
fn config_exchange_scenario() {
    let mut service = Service::default();

    assert!(answered(service.apply(read("cfg"), "reader")).is_empty());
    assert_eq!(
        answered(service.apply(publish("cfg", b"v1"), "writer")),
        vec![
            (
                "reader",
                Ok(Reply::Value {
                    value: b"v1".to_vec()
                })
            ),
            ("writer", Ok(Reply::Ack)),
        ]
    );
    assert_eq!(
        answered(service.apply(withdraw("cfg"), "writer")),
        vec![("writer", Ok(Reply::Ack))]
    );

    let rejected = service.apply(withdraw("cfg"), "writer").unwrap_err();
    assert!(matches!(rejected.error, CoordError::KeyNotPublished { .. }));
}

#[test]
fn counters_route_through_service() {
    let mut service = Service::default();
    let incr = |delta| Operation::Increase {
        name: "steps".to_string(),
        delta,
    };

    assert_eq!(
        answered(service.apply(incr(5), "a")),
        vec![("a", Ok(Reply::Count { value: 5 }))]
    );
    assert_eq!(
        answered(service.apply(incr(5), "a")),
        vec![("a", Ok(Reply::Count { value: 10 }))]
    );
    assert_eq!(
        answered(service.apply(
            Operation::Delete {
                name: "steps".to_string()
            },
            "a"
        )),
        vec![("a", Ok(Reply::Ack))]
    );
    assert_eq!(
        answered(service.apply(incr(5), "a")),
        vec![("a", Ok(Reply::Count { value: 5 }))]
    );

    service
        .apply(
            Operation::Delete {
                name: "steps".to_string(),
            },
            "a",
        )
        .unwrap();
    let rejected = service
        .apply(
            Operation::Delete {
                name: "steps".to_string(),
            },
            "b",
        )
        .unwrap_err();
    assert_eq!(rejected.handle, "b");
    assert!(rejected.error.is_protocol_misuse());
}

#[test]
fn default_reset_clears_locks_and_kv_only() {
    let mut service = Service::default();
    service.apply(lock_op("try", "ckpt"), "a").unwrap();
    service.apply(publish("cfg", b"v1"), "a").unwrap();
    service.apply(arrive("epoch0", 2), "b").unwrap();
    service
        .apply(
            Operation::Increase {
                name: "n".to_string(),
                delta: 1,
            },
            "a",
        )
        .unwrap();

    let resolutions = answered(service.apply(Operation::ResetAll, "admin"));

    assert_eq!(resolutions, vec![("admin", Ok(Reply::Ack))]);
    let stats = service.stats();
    assert_eq!(stats.locks_active, 0);
    assert_eq!(stats.kv_published, 0);
    assert_eq!(stats.parked_arrivals, 1);
    assert_eq!(stats.counters, 1);
    assert_eq!(
        answered(service.apply(lock_op("try", "ckpt"), "c")),
        vec![("c", locked(LockStatus::Locked))]
    );
}

#[test]
fn reset_refused_while_reads_pending_and_changes_nothing() {
    let mut service = Service::default();
    service.apply(lock_op("try", "ckpt"), "a").unwrap();
    service.apply(read("cfg"), "r").unwrap();

    let rejected = service.apply(Operation::ResetAll, "admin").unwrap_err();

    assert_eq!(rejected.handle, "admin");
    assert_eq!(rejected.error, CoordError::ResetWithPendingReads { count: 1 });
    assert_eq!(service.stats().locks_active, 1);
    assert_eq!(service.stats().pending_reads, 1);
}

#[test]
fn reset_without_kv_scope_ignores_pending_reads() {
    let scope = ResetScope {
        kv: false,
        ..ResetScope::default()
    };
    let mut service = Service::new(scope);
    service.apply(read("cfg"), "r").unwrap();

    let resolutions = answered(service.apply(Operation::ResetAll, "admin"));

    assert_eq!(resolutions, vec![("admin", Ok(Reply::Ack))]);
    assert_eq!(service.stats().pending_reads, 1);
}

#[test]
fn reset_cancels_orphaned_await_waiters() {
    let mut service = Service::default();
    service.apply(lock_op("try", "ckpt"), "a").unwrap();
    service.apply(lock_op("await", "ckpt"), "w").unwrap();

    let resolutions = answered(service.apply(Operation::ResetAll, "admin"));

    assert_eq!(resolutions.len(), 2);
    assert_eq!(resolutions[0].0, "w");
    assert!(matches!(resolutions[0].1, Err(CoordError::Cancelled { .. })));
    assert_eq!(resolutions[1], ("admin", Ok(Reply::Ack)));
}

#[test]
fn full_reset_scope_cancels_barriers_and_clears_counters() {
    let mut service = Service::new(ResetScope::all());
    service.apply(arrive("epoch0", 2), "b").unwrap();
    service
        .apply(
            Operation::Increase {
                name: "n".to_string(),
                delta: 1,
            },
            "a",
        )
        .unwrap();

    let resolutions = answered(service.apply(Operation::ResetAll, "admin"));

    assert_eq!(resolutions.len(), 2);
    assert_eq!(resolutions[0].0, "b");
    assert!(resolutions[0].1.is_err());
    assert_eq!(service.stats(), ServiceStats::default());
}

#[test]
fn drain_cancels_every_parked_call() {
    let mut service = Service::default();
    service.apply(arrive("epoch0", 3), "b").unwrap();
    service.apply(lock_op("try", "ckpt"), "a").unwrap();
    service.apply(lock_op("await", "ckpt"), "w").unwrap();
    service.apply(read("cfg"), "r").unwrap();
    assert_eq!(service.stats().parked(), 3);

    let mut drained: Vec<_> = service
        .drain("shutting down")
        .into_iter()
        .map(|r| {
            assert_eq!(r.outcome, Err(CoordError::cancelled("shutting down")));
            r.handle
        })
        .collect();
    drained.sort();

    assert_eq!(drained, vec!["b", "r", "w"]);
    assert_eq!(service.stats().parked(), 0);
}

#[test]
fn registries_use_independent_namespaces() {
    let mut service = Service::default();
    service.apply(lock_op("try", "x"), "a").unwrap();
    service.apply(publish("x", b"1"), "a").unwrap();
    service.apply(arrive("x", 2), "a").unwrap();

    let stats = service.stats();
    assert_eq!(stats.locks_active, 1);
    assert_eq!(stats.kv_published, 1);
    assert_eq!(stats.barriers, 1);
}

#[test]
fn operation_serializes_with_op_tag() {
    let json = serde_json::to_value(arrive("epoch0", 3)).unwrap();

    assert_eq!(
        json,
        serde_json::json!({"op": "Arrive", "name": "epoch0", "count": 3})
    );
}
