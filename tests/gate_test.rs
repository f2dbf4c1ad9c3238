use std::time::Duration;

use document_gateway::{Admission, RateGate, MAX_CONFIG_DURATION};
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(1);

#[test]
fn test_admits_up_to_limit_then_defers_to_oldest_plus_window() {
    let mut gate = RateGate::new(3, WINDOW);
    let t0 = Instant::now();

    assert_eq!(gate.admit(t0), Admission::Go);
    assert_eq!(gate.admit(t0 + Duration::from_millis(100)), Admission::Go);
    assert_eq!(gate.admit(t0 + Duration::from_millis(200)), Admission::Go);

    assert_eq!(
        gate.admit(t0 + Duration::from_millis(300)),
        Admission::WaitUntil(t0 + WINDOW)
    );
    // A refusal records nothing.
    assert_eq!(gate.snapshot(t0 + Duration::from_millis(300)).in_window, 3);
}

#[test]
fn test_wait_until_instant_is_admissible() {
    let mut gate = RateGate::new(2, WINDOW);
    let t0 = Instant::now();
    gate.admit(t0);
    gate.admit(t0 + Duration::from_millis(400));

    let Admission::WaitUntil(ready_at) = gate.admit(t0 + Duration::from_millis(500)) else {
        panic!("window should be full");
    };
    assert_eq!(ready_at, t0 + WINDOW);

    // Exactly at the boundary the oldest admission no longer counts.
    assert_eq!(gate.admit(ready_at), Admission::Go);
    assert_eq!(
        gate.admit(ready_at),
        Admission::WaitUntil(t0 + Duration::from_millis(400) + WINDOW)
    );
}

#[test]
fn test_just_before_boundary_is_still_inside_window() {
    let mut gate = RateGate::new(1, WINDOW);
    let t0 = Instant::now();
    gate.admit(t0);

    let almost = t0 + WINDOW - Duration::from_nanos(1);
    assert_eq!(gate.admit(almost), Admission::WaitUntil(t0 + WINDOW));
}

#[test]
fn test_single_slot_spaces_admissions_by_window() {
    let window = Duration::from_millis(200);
    let mut gate = RateGate::new(1, window);
    let mut now = Instant::now();
    let mut admitted = Vec::new();

    while admitted.len() < 5 {
        match gate.admit(now) {
            Admission::Go => admitted.push(now),
            Admission::WaitUntil(t) => now = t,
        }
    }

    for pair in admitted.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= window);
    }
}

#[test]
fn test_sliding_window_rejects_boundary_double_burst() {
    // A fixed bucket would allow 2 at 0.9s and 2 more at 1.0s.
    let mut gate = RateGate::new(2, WINDOW);
    let t0 = Instant::now();
    let late = t0 + Duration::from_millis(900);

    assert_eq!(gate.admit(late), Admission::Go);
    assert_eq!(gate.admit(late), Admission::Go);
    assert_eq!(
        gate.admit(t0 + WINDOW),
        Admission::WaitUntil(late + WINDOW)
    );
}

#[test]
fn test_window_empties_after_idle() {
    let mut gate = RateGate::new(3, WINDOW);
    let t0 = Instant::now();
    gate.admit(t0);

    let later = t0 + Duration::from_secs(2);
    for _ in 0..3 {
        assert_eq!(gate.admit(later), Admission::Go);
    }
    assert_eq!(gate.admit(later), Admission::WaitUntil(later + WINDOW));
}

#[test]
fn test_earlier_instant_does_not_shrink_window() {
    let mut gate = RateGate::new(2, WINDOW);
    let t0 = Instant::now();
    let t1 = t0 + Duration::from_millis(500);

    assert_eq!(gate.admit(t1), Admission::Go);
    // A stale `now` is treated as the latest recorded admission.
    assert_eq!(gate.admit(t0), Admission::Go);
    assert_eq!(gate.admit(t1), Admission::WaitUntil(t1 + WINDOW));
}

#[test]
fn test_snapshot_reports_live_admissions() {
    let mut gate = RateGate::new(4, WINDOW);
    let t0 = Instant::now();
    gate.admit(t0);
    gate.admit(t0 + Duration::from_millis(600));

    let stats = gate.snapshot(t0 + Duration::from_millis(1_100));
    assert_eq!(stats.limit, 4);
    assert_eq!(stats.window, WINDOW);
    assert_eq!(stats.in_window, 1);
    assert_eq!(stats.oldest_age, Some(Duration::from_millis(500)));
}

#[test]
fn test_zero_limit_is_clamped_to_one() {
    let gate = RateGate::new(0, WINDOW);
    assert_eq!(gate.limit(), 1);
}

#[test]
fn test_oversized_window_is_capped() {
    let mut gate = RateGate::new(1, Duration::MAX);
    assert_eq!(gate.window(), MAX_CONFIG_DURATION);

    let now = Instant::now();
    assert_eq!(gate.admit(now), Admission::Go);
    assert_eq!(gate.admit(now), Admission::WaitUntil(now + MAX_CONFIG_DURATION));
}
