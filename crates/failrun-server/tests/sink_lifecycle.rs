//! Per-sink task: ticks, idle expiry, shutdown.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use failrun_core::error::FailRunError;
use failrun_core::{Measurement, SinkId};
use failrun_server::sink::{ExpiryReason, MonotonicClock, Phase, Sink, SinkHandle};

const T0: i64 = 1_700_000_000;

struct Harness {
    sink: SinkHandle,
    stop: watch::Sender<bool>,
    expired: Arc<Mutex<Vec<ExpiryReason>>>,
}

fn spawn(die_in_secs: u64) -> Harness {
    let (stop, stop_rx) = watch::channel(false);
    let expired = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&expired);
    let sink = Sink::spawn(
        SinkId::parse("lifecycle").unwrap(),
        1,
        Duration::from_secs(die_in_secs),
        Arc::new(MonotonicClock::starting_at(T0)),
        stop_rx,
        Box::new(move |_: &Sink, reason: ExpiryReason| log.lock().unwrap().push(reason)),
    );
    Harness { sink, stop, expired }
}

fn m(utc_unix: i64, rps: u64) -> Measurement {
    Measurement { utc_unix, rps }
}

#[tokio::test(start_paused = true)]
async fn hits_in_one_second_share_a_bucket() {
    let h = spawn(30);
    h.sink.record_hit().await.unwrap();
    let snap = h.sink.record_hit().await.unwrap();
    assert_eq!(snap, vec![m(T0, 2)]);
}

#[tokio::test(start_paused = true)]
async fn one_bucket_per_second_plus_the_initial_one() {
    let h = spawn(30);
    h.sink.record_hit().await.unwrap();

    sleep(Duration::from_millis(1500)).await;
    h.sink.record_hit().await.unwrap();
    sleep(Duration::from_secs(1)).await;
    h.sink.record_hit().await.unwrap();
    sleep(Duration::from_secs(1)).await;
    let snap = h.sink.record_hit().await.unwrap();

    assert_eq!(snap, vec![m(T0, 1), m(T0 + 1, 1), m(T0 + 2, 1), m(T0 + 3, 1)]);
}

#[tokio::test(start_paused = true)]
async fn quiet_seconds_show_up_as_zero_buckets_and_oldest_drop_first() {
    let h = spawn(3);
    h.sink.record_hit().await.unwrap();

    sleep(Duration::from_millis(2500)).await;
    let snap = h.sink.record_hit().await.unwrap();
    assert_eq!(snap, vec![m(T0, 1), m(T0 + 1, 0), m(T0 + 2, 1)]);

    sleep(Duration::from_secs(2)).await;
    let snap = h.sink.record_hit().await.unwrap();
    assert_eq!(snap, vec![m(T0 + 2, 1), m(T0 + 3, 0), m(T0 + 4, 1)]);
}

#[tokio::test(start_paused = true)]
async fn window_never_exceeds_history_while_kept_alive() {
    let h = spawn(3);
    for _ in 0..10 {
        let snap = h.sink.record_hit().await.unwrap();
        assert!(snap.len() <= 3);
        assert!(snap.windows(2).all(|w| w[0].utc_unix < w[1].utc_unix));
        sleep(Duration::from_millis(900)).await;
    }
    assert_eq!(h.sink.snapshot().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn expires_once_after_idle_timeout() {
    let h = spawn(2);

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.sink.phase().await, Phase::Active);
    assert!(h.expired.lock().unwrap().is_empty());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.sink.phase().await, Phase::Destroyed);
    assert_eq!(*h.expired.lock().unwrap(), vec![ExpiryReason::Idle]);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.expired.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn hits_push_the_deadline_back() {
    let h = spawn(2);

    sleep(Duration::from_millis(1500)).await;
    h.sink.record_hit().await.unwrap();
    sleep(Duration::from_millis(1500)).await;
    h.sink.record_hit().await.unwrap();

    // last hit at 3.0s, so alive until 5.0s
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.sink.phase().await, Phase::Active);

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.sink.phase().await, Phase::Destroyed);
    assert_eq!(*h.expired.lock().unwrap(), vec![ExpiryReason::Idle]);
}

#[tokio::test(start_paused = true)]
async fn hit_after_expiry_is_refused_and_not_counted() {
    let h = spawn(1);
    h.sink.record_hit().await.unwrap();
    sleep(Duration::from_millis(1500)).await;

    let before = h.sink.snapshot().await;
    let err = h.sink.record_hit().await.expect_err("sink is gone");
    assert!(matches!(err, FailRunError::SinkExpired(ref id) if id == "lifecycle"));
    assert_eq!(h.sink.snapshot().await, before);
}

#[tokio::test(start_paused = true)]
async fn stop_signal_expires_with_shutdown_reason() {
    let h = spawn(30);
    h.sink.record_hit().await.unwrap();

    h.stop.send_replace(true);
    sleep(Duration::from_millis(10)).await;

    assert_eq!(h.sink.phase().await, Phase::Destroyed);
    assert_eq!(*h.expired.lock().unwrap(), vec![ExpiryReason::Shutdown]);
}

#[tokio::test(start_paused = true)]
async fn dropped_stop_sender_also_shuts_down() {
    let Harness { sink, stop, expired } = spawn(30);
    drop(stop);
    sleep(Duration::from_millis(10)).await;

    assert_eq!(sink.phase().await, Phase::Destroyed);
    assert_eq!(*expired.lock().unwrap(), vec![ExpiryReason::Shutdown]);
}

#[tokio::test(start_paused = true)]
async fn burst_of_hits_never_blocks_on_the_activity_signal() {
    let h = spawn(30);
    let mut last = Vec::new();
    for _ in 0..1000 {
        last = h.sink.record_hit().await.unwrap();
    }
    assert_eq!(last, vec![m(T0, 1000)]);
}
