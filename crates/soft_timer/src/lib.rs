// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(
    test,
    allow(
        clippy::arithmetic_side_effects,
        clippy::unwrap_used,
        reason = "allow these lints in tests to improve the readability of the tests"
    )
)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Software timers driven by an application-supplied 32-bit tick counter.
//!
//! Applications without an operating system timer service, or with too few hardware timers,
//! often multiplex many logical timers over one periodic tick. This crate keeps a registry of
//! such timers, lets the application start, stop, resume and restart them, and fires the
//! expired ones from a [`poll`](TimerRegistry::poll) the application calls periodically.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! use soft_timer::{TickSource, Timer, TimerMode, TimerRegistry};
//!
//! // Advanced by a periodic interrupt in a real application.
//! let ticks = Arc::new(AtomicU32::new(0));
//! let mut registry: TimerRegistry = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));
//!
//! let blink = registry.create(Timer::new().with_callback(|_| println!("blink")))?;
//! registry.start(blink, TimerMode::Loop, 500)?;
//!
//! // main loop
//! for _ in 0..1_000 {
//!     ticks.fetch_add(1, Ordering::Relaxed);
//!     registry.poll();
//! }
//! # Ok::<(), soft_timer::Error>(())
//! ```
//!
//! # Overview
//!
//! - [`TickSource`] - The external tick counter. Monotonic modulo 2<sup>32</sup>.
//! - [`Timer`] - The storage of one timer: optional callback, optional user data and its
//!   scheduling state.
//! - [`TimerRegistry`] - The ordered collection of timers bound to one tick source. Controls
//!   timers through [`TimerId`] handles and fires them from [`poll`](TimerRegistry::poll).
//! - [`Expired`] - The context a timeout callback receives. Dereferences to the registry.
//! - [`RegistryBuilder`] - Configures a registry: [`ReschedulePolicy`], capacity and
//!   whether timers may be created dynamically.
//! - [`ticks`] - Wraparound-safe tick arithmetic.
//! - [`Error`] - Returned when the registry is misused. Provides introspection through
//!   [`ErrorKind`].
//!
//! # Tick Wraparound
//!
//! The tick counter wraps at 2<sup>32</sup>. Deadlines are compared by unsigned subtraction,
//! so a timer started shortly before the counter wraps still fires at the right tick. An
//! interval must stay below 2<sup>31</sup> ticks; [`start`](TimerRegistry::start) rejects
//! longer ones.
//!
//! # Threading
//!
//! A registry is driven from a single context; every operation takes `&mut self` and there is
//! no internal locking. Callbacks run synchronously inside `poll` and can operate on the
//! registry through [`Expired`]. Tick sources and callbacks are `Send`, so the registry can be
//! moved to another thread or shared behind a lock.
//!
//! # Testing
//!
//! With the `test-util` feature, [`TickControl`] provides a tick counter that tests move by
//! hand.
//!
//! > **Important:** Never enable the `test-util` feature for production code. Only use it in your `dev-dependencies`.
//!
//! # Features
//!
//! - **`logs`** (default) - Emits structured [`tracing`](https://docs.rs/tracing) events
//!   when timers are registered, started, expired or detached, and a warning when an
//!   operation is rejected.
//! - **`test-util`** - Enables [`TickControl`]. **Only enable this in `dev-dependencies`.**

mod builder;
mod dispatch;
mod error;
mod registry;
mod telemetry;
#[cfg(test)]
mod testing;
#[cfg(any(feature = "test-util", test))]
mod tick_control;
mod tick_source;
pub mod ticks;
mod timer;

pub use builder::{RegistryBuilder, ReschedulePolicy};
pub use dispatch::Expired;
pub use error::{Error, ErrorKind, Result};
pub use registry::{TimerId, TimerRegistry};
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub use tick_control::TickControl;
pub use tick_source::TickSource;
pub use timer::{TimeoutCallback, Timer, TimerMode, TimerState};
