// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn event(start_time: f64, stop_time: f64) -> ActEvent {
    ActEvent {
        actor_id: 7,
        work_stream_id: 1,
        act_id: 3,
        ready_time: 0.5,
        start_time,
        stop_time,
    }
}

#[test]
fn duration_is_stop_minus_start() {
    assert_eq!(event(1.0, 3.5).duration(), 2.5);
}

#[test]
fn inverted_timestamps_give_zero_duration() {
    assert_eq!(event(4.0, 2.0).duration(), 0.0);
}

#[test]
fn records_are_tagged_by_record_field() {
    let record = TelemetryRecord::ActInterval(ActIntervalSample {
        actor_id: 9,
        avg_act_interval: 0.25,
    });
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["record"], "ActInterval");
    assert_eq!(json["actor_id"], 9);

    let parsed: TelemetryRecord = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn actor_id_reads_through_either_variant() {
    assert_eq!(TelemetryRecord::ActEvent(event(0.0, 1.0)).actor_id(), 7);
}
