//! Tests for utility functions

use deadline_engine::util::{now_ms, Clock, ManualClock, SystemClock};

#[test]
fn test_system_clock_tracks_wall_time() {
    let before = now_ms();
    let reading = SystemClock.now();
    let after = now_ms();
    assert!(before <= reading && reading <= after);
}

#[test]
fn test_manual_clock_is_shared_between_clones() {
    let clock = ManualClock::new(100);
    let observer = clock.clone();

    clock.set(250);
    assert_eq!(observer.now(), 250);
    assert_eq!(observer.advance(50), 300);
    assert_eq!(clock.now(), 300);
}

#[test]
fn test_manual_clock_allows_negative_time() {
    let clock = ManualClock::new(0);
    assert_eq!(clock.advance(-10), -10);
}

#[test]
fn test_init_tracing_is_idempotent() {
    deadline_engine::util::init_tracing();
    deadline_engine::util::init_tracing();
}
