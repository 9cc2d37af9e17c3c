// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is a test module")]
#![allow(clippy::unwrap_used, reason = "This is a test module")]

//! End-to-end timing scenarios driven by an atomic tick counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use soft_timer::{TickSource, Timer, TimerId, TimerMode, TimerRegistry, TimerState};

struct Harness {
    ticks: Arc<AtomicU32>,
    fired: Arc<AtomicUsize>,
    registry: TimerRegistry,
    id: TimerId,
}

impl Harness {
    fn new(start: u32) -> Self {
        let ticks = Arc::new(AtomicU32::new(start));
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);

        let mut registry = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));
        let id = registry
            .create(Timer::new().with_callback(move |_| {
                fired_clone.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();

        Self {
            ticks,
            fired,
            registry,
            id,
        }
    }

    fn poll_at(&mut self, tick: u32) -> usize {
        self.ticks.store(tick, Ordering::Relaxed);
        self.registry.poll()
    }

    fn fired(&self) -> usize {
        self.fired.load(Ordering::Relaxed)
    }
}

#[test]
fn loop_timer_counts_expirations() {
    let mut harness = Harness::new(0);
    harness.registry.start(harness.id, TimerMode::Loop, 5).unwrap();

    harness.poll_at(5);
    assert_eq!(harness.fired(), 1);
    assert_eq!(harness.registry.deadline(harness.id).unwrap(), 10);

    harness.poll_at(9);
    assert_eq!(harness.fired(), 1);

    harness.poll_at(10);
    assert_eq!(harness.fired(), 2);
}

#[test]
fn loop_timer_fires_at_every_multiple() {
    let mut harness = Harness::new(0);
    harness.registry.start(harness.id, TimerMode::Loop, 7).unwrap();

    let fired_at: Vec<u32> = (1..=50).filter(|&tick| harness.poll_at(tick) == 1).collect();

    assert_eq!(fired_at, vec![7, 14, 21, 28, 35, 42, 49]);
}

#[test]
fn no_expiry_before_interval_elapses() {
    let mut harness = Harness::new(1_000);
    harness.registry.start(harness.id, TimerMode::Single, 100).unwrap();

    for tick in 1_000..1_100 {
        assert_eq!(harness.poll_at(tick), 0, "fired early at tick {tick}");
    }

    assert_eq!(harness.poll_at(1_100), 1);
}

#[test]
fn deadline_across_wraparound() {
    let mut harness = Harness::new(0xFFFF_FFE0);
    harness.registry.start(harness.id, TimerMode::Single, 16).unwrap();
    assert_eq!(harness.registry.deadline(harness.id).unwrap(), 0xFFFF_FFF0);

    assert_eq!(harness.poll_at(0xFFFF_FFEF), 0);
    assert_eq!(harness.poll_at(0xFFFF_FFF0), 1);
    assert_eq!(harness.fired(), 1);
}

#[test]
fn overdue_timer_fires_after_counter_wrapped() {
    for tick in [0xFFFF_FFF0, 0xFFFF_FFF8, 0xFFFF_FFFF, 0x0000_0000, 0x0000_0005] {
        let mut harness = Harness::new(0xFFFF_FFE0);
        harness.registry.start(harness.id, TimerMode::Single, 16).unwrap();

        assert_eq!(harness.poll_at(tick), 1, "not due at tick {tick:#x}");
    }
}

#[test]
fn loop_timer_keeps_period_across_wraparound() {
    let mut harness = Harness::new(u32::MAX - 9);
    harness.registry.start(harness.id, TimerMode::Loop, 10).unwrap();
    assert_eq!(harness.registry.deadline(harness.id).unwrap(), 0);

    assert_eq!(harness.poll_at(u32::MAX), 0);
    assert_eq!(harness.poll_at(0), 1);
    assert_eq!(harness.registry.deadline(harness.id).unwrap(), 10);
    assert_eq!(harness.poll_at(9), 0);
    assert_eq!(harness.poll_at(10), 1);
}

#[test]
fn single_timer_fires_exactly_once() {
    let mut harness = Harness::new(0);
    harness.registry.start(harness.id, TimerMode::Single, 3).unwrap();

    for tick in 1..=30 {
        harness.poll_at(tick);
    }

    assert_eq!(harness.fired(), 1);
    assert_eq!(harness.registry.state(harness.id).unwrap(), TimerState::Timeout);
    assert!(!harness.registry.is_enabled(harness.id).unwrap());

    harness.registry.restart(harness.id).unwrap();
    assert_eq!(harness.poll_at(33), 1);
    assert_eq!(harness.fired(), 2);
}

#[test]
fn resume_does_not_credit_stopped_time() {
    let mut harness = Harness::new(0);
    harness.registry.start(harness.id, TimerMode::Single, 10).unwrap();
    harness.poll_at(4);
    harness.registry.stop(harness.id).unwrap();

    assert_eq!(harness.poll_at(20), 0);
    harness.registry.resume(harness.id).unwrap();

    assert_eq!(harness.poll_at(20), 1);
    assert_eq!(harness.fired(), 1);
}

#[test]
fn stopped_loop_timer_stays_silent() {
    let mut harness = Harness::new(0);
    harness.registry.start(harness.id, TimerMode::Loop, 2).unwrap();
    harness.poll_at(2);

    harness.registry.stop(harness.id).unwrap();
    for tick in 3..20 {
        harness.poll_at(tick);
    }

    assert_eq!(harness.fired(), 1);
}

#[test]
fn deleted_timer_never_fires() {
    let mut harness = Harness::new(0);
    harness.registry.start(harness.id, TimerMode::Loop, 1).unwrap();
    harness.registry.delete(harness.id).unwrap();

    for tick in 1..10 {
        assert_eq!(harness.poll_at(tick), 0);
    }

    assert_eq!(harness.fired(), 0);
}
