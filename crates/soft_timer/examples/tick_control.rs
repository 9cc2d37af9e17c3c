// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(clippy::unwrap_used, reason = "example code")]

//! This example demonstrates how to use `TickControl` to move the tick counter by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use soft_timer::{TickControl, Timer, TimerMode, TimerRegistry, TimerState};

fn main() {
    let control = TickControl::new_at(u32::MAX - 2);
    let mut registry: TimerRegistry = TimerRegistry::new(&control);

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = Arc::clone(&fired);
    let id = registry
        .create(Timer::new().with_callback(move |_| {
            fired_clone.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();

    // The deadline lies past the wraparound of the counter.
    registry.start(id, TimerMode::Single, 5).unwrap();
    assert_eq!(registry.deadline(id).unwrap(), 2);

    // Time does not move on its own.
    assert_eq!(registry.poll(), 0);

    control.advance(4);
    assert_eq!(registry.poll(), 0);
    assert_eq!(registry.remaining(id).unwrap(), Some(1));

    control.advance(1);
    assert_eq!(registry.poll(), 1);
    assert_eq!(registry.state(id).unwrap(), TimerState::Timeout);
    assert_eq!(fired.load(Ordering::Relaxed), 1);
}
