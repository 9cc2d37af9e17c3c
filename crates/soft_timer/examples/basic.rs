// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! This example drives a registry from a simulated interrupt and a main loop.
//!
//! A background thread plays the role of a 1 ms periodic interrupt that advances the tick
//! counter. The main loop polls the registry, which fires a repeating "blink" timer and a
//! one-shot "watchdog" timer that is kept from firing by restarting it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use soft_timer::{TickSource, Timer, TimerMode, TimerRegistry};

fn main() -> Result<(), soft_timer::Error> {
    let ticks = Arc::new(AtomicU32::new(0));
    let done = Arc::new(AtomicBool::new(false));

    let interrupt = {
        let ticks = Arc::clone(&ticks);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(1));
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let mut registry: TimerRegistry<&'static str> = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));

    let blink = registry.create(Timer::new().with_user_data("blink").with_callback(|expired| {
        println!("{} at tick {}", expired.user_data().unwrap_or(&"?"), expired.now());
    }))?;
    registry.start(blink, TimerMode::Loop, 50)?;

    let watchdog = registry.create(Timer::new().with_user_data("watchdog").with_callback(|expired| {
        println!("{} expired at tick {}", expired.user_data().unwrap_or(&"?"), expired.now());
    }))?;
    registry.start(watchdog, TimerMode::Single, 100)?;

    let mut fired = 0;
    while registry.now() < 300 {
        fired += registry.poll();

        // feed the watchdog for the first 150 ticks
        if registry.now() < 150 {
            registry.restart(watchdog)?;
        }

        thread::sleep(Duration::from_micros(200));
    }

    done.store(true, Ordering::Relaxed);
    let _ = interrupt.join();

    println!("{fired} timers fired, watchdog is {}", registry.state(watchdog)?.as_str());
    registry.clear();
    Ok(())
}
