//! Measurement window behavior.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use failrun_core::measure::{encode_snapshot, Measurement, MeasurementWindow};

const T0: i64 = 1_700_000_000;

#[test]
fn starts_with_one_open_bucket() {
    let w = MeasurementWindow::new(T0, 30);
    assert_eq!(w.snapshot(), vec![Measurement::empty(T0)]);
    assert_eq!(w.max_history(), 30);
}

#[test]
fn hits_in_one_second_share_a_bucket() {
    let mut w = MeasurementWindow::new(T0, 30);
    w.hit();
    w.hit();
    assert_eq!(w.len(), 1);
    assert_eq!(w.current().unwrap().rps, 2);
}

#[test]
fn ticks_open_zero_buckets_and_close_the_old_one() {
    let mut w = MeasurementWindow::new(T0, 30);
    w.hit();
    w.tick(T0 + 1);
    w.tick(T0 + 2);
    w.hit();

    let snap = w.snapshot();
    assert_eq!(
        snap,
        vec![
            Measurement { utc_unix: T0, rps: 1 },
            Measurement { utc_unix: T0 + 1, rps: 0 },
            Measurement { utc_unix: T0 + 2, rps: 1 },
        ]
    );
}

#[test]
fn drops_oldest_once_full() {
    let mut w = MeasurementWindow::new(T0, 3);
    for s in 1..=5 {
        w.tick(T0 + s);
    }
    let secs: Vec<i64> = w.snapshot().iter().map(|m| m.utc_unix).collect();
    assert_eq!(secs, vec![T0 + 3, T0 + 4, T0 + 5]);
}

#[test]
fn zero_history_is_clamped_to_one() {
    let mut w = MeasurementWindow::new(T0, 0);
    w.tick(T0 + 1);
    assert_eq!(w.len(), 1);
    assert_eq!(w.current().unwrap().utc_unix, T0 + 1);
}

#[test]
fn snapshot_is_a_copy() {
    let mut w = MeasurementWindow::new(T0, 5);
    let before = w.snapshot();
    w.hit();
    assert_eq!(before[0].rps, 0);
    assert_eq!(w.current().unwrap().rps, 1);
}

#[test]
fn encodes_with_wire_field_names() {
    let body = encode_snapshot(&[Measurement { utc_unix: T0, rps: 5 }]).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v, serde_json::json!([{ "utc_unix": T0, "rps": 5 }]));
}
