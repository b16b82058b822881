// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end coordination scenarios over real sockets

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use rdv_core::{ActEvent, LockStatus, ServiceStats};
use rdv_daemon::config::Config;
use rdv_daemon::lifecycle::{self, LifecycleError};
use rdv_daemon::protocol::ProtocolError;
use rdv_daemon::{ClientError, CoordClient, Endpoint, ErrorKind};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(5);

struct TestDaemon {
    _temp: TempDir,
    config: Config,
    client: CoordClient,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), LifecycleError>>,
}

impl TestDaemon {
    async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    async fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let temp = TempDir::new().unwrap();
        let endpoint = Endpoint::Unix(temp.path().join("rdv.sock"));
        Self::launch(temp, endpoint, configure).await
    }

    /// Listen on an ephemeral loopback TCP port
    async fn start_tcp() -> Self {
        let temp = TempDir::new().unwrap();
        let endpoint = Endpoint::Tcp("127.0.0.1:0".to_string());
        Self::launch(temp, endpoint, |_| {}).await
    }

    async fn launch(
        temp: TempDir,
        endpoint: Endpoint,
        configure: impl FnOnce(&mut Config),
    ) -> Self {
        let mut config = Config::for_endpoint(endpoint, &temp.path().join("state"));
        configure(&mut config);

        let mut daemon = lifecycle::startup(&config).await.unwrap();
        let bound = daemon.listener.local_endpoint().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            daemon
                .run(async {
                    let _ = stopped.await;
                })
                .await;
            daemon.shutdown().await
        });

        let client = CoordClient::new(bound).with_ipc_timeout(WAIT);
        Self {
            _temp: temp,
            config,
            client,
            stop: Some(stop),
            task,
        }
    }

    /// Poll status until `done` holds
    async fn wait_for(&self, done: impl Fn(&ServiceStats) -> bool) {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let report = self.client.status().await.unwrap();
            if done(&report.stats) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached, last stats: {:?}",
                report.stats
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await.unwrap().unwrap();
    }
}

fn spawn_arrive(
    client: &CoordClient,
    name: &str,
    count: u32,
) -> JoinHandle<Result<(), ClientError>> {
    let client = client.clone();
    let name = name.to_string();
    tokio::spawn(async move { client.arrive(&name, count, Some(WAIT)).await })
}

#[tokio::test]
async fn control_requests() {
    let daemon = TestDaemon::start().await;

    daemon.client.ping().await.unwrap();
    assert_eq!(
        daemon.client.hello().await.unwrap(),
        rdv_daemon::PROTOCOL_VERSION
    );
    assert_eq!(daemon.client.status().await.unwrap().stats, ServiceStats::default());

    daemon.stop().await;
}

#[tokio::test]
async fn barrier_has_no_partial_release() {
    let daemon = TestDaemon::start().await;

    let first = spawn_arrive(&daemon.client, "epoch0", 3);
    let second = spawn_arrive(&daemon.client, "epoch0", 3);
    daemon.wait_for(|s| s.parked_arrivals == 2).await;
    assert!(!first.is_finished());
    assert!(!second.is_finished());

    daemon.client.arrive("epoch0", 3, Some(WAIT)).await.unwrap();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // A later arrival starts a fresh barrier
    let again = spawn_arrive(&daemon.client, "epoch0", 1);
    again.await.unwrap().unwrap();
    daemon.wait_for(|s| s.barriers == 0).await;

    daemon.stop().await;
}

#[tokio::test]
async fn barrier_releases_over_tcp() {
    let daemon = TestDaemon::start_tcp().await;
    assert!(matches!(
        daemon.client.endpoint(),
        Endpoint::Tcp(addr) if !addr.ends_with(":0")
    ));

    let first = spawn_arrive(&daemon.client, "epoch0", 3);
    let second = spawn_arrive(&daemon.client, "epoch0", 3);
    daemon.wait_for(|s| s.parked_arrivals == 2).await;
    assert!(!first.is_finished());
    assert!(!second.is_finished());

    daemon.client.arrive("epoch0", 3, Some(WAIT)).await.unwrap();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    daemon.wait_for(|s| s.barriers == 0).await;

    daemon.stop().await;
}

#[tokio::test]
async fn timed_out_read_stays_parked_and_blocks_reset() {
    let daemon = TestDaemon::start().await;
    let client = &daemon.client;

    let err = client
        .read("ghost", Some(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ClientError::Protocol(ProtocolError::Timeout)),
        "got {:?}",
        err
    );
    daemon.wait_for(|s| s.pending_reads == 1).await;

    let err = client.reset_all().await.unwrap_err();
    assert!(err.is_kind(ErrorKind::ProtocolMisuse), "got {:?}", err);

    // Publishing releases the orphaned read and unblocks reset
    client.publish("ghost", b"late").await.unwrap();
    daemon.wait_for(|s| s.pending_reads == 0).await;
    client.reset_all().await.unwrap();

    daemon.stop().await;
}

#[tokio::test]
async fn timed_out_arrival_still_counts_toward_quorum() {
    let daemon = TestDaemon::start().await;
    let client = &daemon.client;

    let err = client
        .arrive("epoch0", 2, Some(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Protocol(ProtocolError::Timeout)));
    daemon.wait_for(|s| s.parked_arrivals == 1).await;

    // The retry completes the barrier together with the abandoned arrival
    client.arrive("epoch0", 2, Some(WAIT)).await.unwrap();
    daemon.wait_for(|s| s.barriers == 0).await;

    daemon.stop().await;
}

#[tokio::test]
async fn completion_lock_scenario() {
    let daemon = TestDaemon::start().await;
    let client = &daemon.client;

    assert_eq!(client.try_acquire("ckpt").await.unwrap(), LockStatus::Locked);
    assert_eq!(
        client.try_acquire("ckpt").await.unwrap(),
        LockStatus::InProgress
    );

    let waiter = {
        let client = client.clone();
        tokio::spawn(async move { client.await_done("ckpt", Some(WAIT)).await })
    };
    daemon.wait_for(|s| s.await_waiters == 1).await;

    client.signal_done("ckpt").await.unwrap();
    waiter.await.unwrap().unwrap();

    assert_eq!(client.try_acquire("ckpt").await.unwrap(), LockStatus::Done);
    client.await_done("ckpt", Some(WAIT)).await.unwrap();

    let err = client.signal_done("ckpt").await.unwrap_err();
    assert!(err.is_kind(ErrorKind::ProtocolMisuse), "got {:?}", err);

    daemon.stop().await;
}

#[tokio::test]
async fn kv_exchange_scenario() {
    let daemon = TestDaemon::start().await;
    let client = &daemon.client;

    let reader = {
        let client = client.clone();
        tokio::spawn(async move { client.read("cfg", Some(WAIT)).await })
    };
    daemon.wait_for(|s| s.pending_reads == 1).await;

    // Withdraw with a pending read is refused and the read survives
    let err = client.withdraw("cfg").await.unwrap_err();
    assert!(err.is_kind(ErrorKind::ProtocolMisuse));
    assert!(!reader.is_finished());

    client.publish("cfg", b"v1").await.unwrap();
    assert_eq!(reader.await.unwrap().unwrap(), b"v1".to_vec());

    assert_eq!(client.read("cfg", Some(WAIT)).await.unwrap(), b"v1".to_vec());
    client.withdraw("cfg").await.unwrap();
    let err = client.withdraw("cfg").await.unwrap_err();
    assert!(err.is_kind(ErrorKind::ProtocolMisuse));

    daemon.stop().await;
}

#[tokio::test]
async fn counters() {
    let daemon = TestDaemon::start().await;
    let client = &daemon.client;

    assert_eq!(client.increase("steps", 5).await.unwrap(), 5);
    assert_eq!(client.increase("steps", -2).await.unwrap(), 3);
    client.delete_counter("steps").await.unwrap();
    assert_eq!(client.increase("steps", 1).await.unwrap(), 1);

    let err = client.delete_counter("missing").await.unwrap_err();
    assert!(err.is_kind(ErrorKind::ProtocolMisuse));

    daemon.stop().await;
}

#[tokio::test]
async fn reset_clears_locks_and_kv() {
    let daemon = TestDaemon::start().await;
    let client = &daemon.client;

    client.try_acquire("ckpt").await.unwrap();
    client.publish("cfg", b"v1").await.unwrap();
    client.increase("steps", 4).await.unwrap();

    client.reset_all().await.unwrap();

    assert_eq!(client.try_acquire("ckpt").await.unwrap(), LockStatus::Locked);
    client.publish("cfg", b"v2").await.unwrap();
    // Counters are outside the default reset scope
    assert_eq!(client.increase("steps", 1).await.unwrap(), 5);

    daemon.stop().await;
}

#[tokio::test]
async fn parked_calls_do_not_exhaust_accept_capacity() {
    let daemon = TestDaemon::start_with(|c| c.accept_capacity = 1).await;
    let client = &daemon.client;

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.read("k", Some(WAIT)).await })
        })
        .collect();
    daemon.wait_for(|s| s.pending_reads == 4).await;

    client.publish("k", b"x").await.unwrap();
    for reader in readers {
        assert_eq!(reader.await.unwrap().unwrap(), b"x".to_vec());
    }

    daemon.stop().await;
}

#[tokio::test]
async fn shutdown_cancels_parked_calls() {
    let daemon = TestDaemon::start().await;

    let arrival = spawn_arrive(&daemon.client, "epoch0", 2);
    daemon.wait_for(|s| s.parked_arrivals == 1).await;

    daemon.client.shutdown().await.unwrap();

    let err = arrival.await.unwrap().unwrap_err();
    assert!(err.is_kind(ErrorKind::Cancelled), "got {:?}", err);

    let TestDaemon {
        _temp, config, task, ..
    } = daemon;
    task.await.unwrap().unwrap();
    assert!(!config.lock_path.exists());
    assert!(config.endpoint.socket_path().is_some_and(|p| !p.exists()));
}

#[tokio::test]
async fn abort_policy_stops_daemon_on_misuse() {
    let daemon = TestDaemon::start_with(|c| {
        c.on_misuse = rdv_daemon::MisusePolicy::Abort;
    })
    .await;

    let err = daemon.client.arrive("b", 0, Some(WAIT)).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::ProtocolMisuse));

    let TestDaemon {
        _temp, client, task, ..
    } = daemon;
    task.await.unwrap().unwrap();
    assert!(matches!(
        client.ping().await,
        Err(ClientError::DaemonNotRunning(_))
    ));
}

#[tokio::test]
async fn telemetry_reaches_file_sink() {
    let daemon = TestDaemon::start().await;

    daemon
        .client
        .push_act_event(ActEvent {
            actor_id: 3,
            work_stream_id: 0,
            act_id: 1,
            ready_time: 0.0,
            start_time: 0.5,
            stop_time: 1.0,
        })
        .await
        .unwrap();
    daemon.client.push_act_interval(3, 0.25).await.unwrap();

    // Forwarded after the ack; the next round-trip is dispatched after it
    daemon.client.ping().await.unwrap();

    let dir = daemon.config.telemetry_dir.clone();
    let events = std::fs::read_to_string(dir.join("act_events.jsonl")).unwrap();
    let intervals = std::fs::read_to_string(dir.join("act_intervals.jsonl")).unwrap();
    assert_eq!(events.lines().count(), 1);
    assert!(intervals.contains("\"avg_act_interval\":0.25"));

    daemon.stop().await;
}

#[tokio::test]
async fn disabled_telemetry_writes_nothing() {
    let daemon = TestDaemon::start_with(|c| c.telemetry_enabled = false).await;

    daemon.client.push_act_interval(1, 1.0).await.unwrap();
    daemon.client.ping().await.unwrap();

    assert!(!daemon.config.telemetry_dir.exists());
    daemon.stop().await;
}
