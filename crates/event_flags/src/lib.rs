// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, reason = "allow these lints in tests to improve the readability of the tests")
)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Non-blocking 32-bit event flag groups.
//!
//! An event flag group is a set of up to 32 independent events, one per bit. Producers set
//! bits with `send`. A consumer asks with `recv` whether a combination of bits is present,
//! either [all](Wait::All) of them or [any](Wait::Any) of them, and may clear the bits it
//! consumed. There is no waiting: `recv` answers for the current state and leaves the state
//! untouched when the condition does not hold.
//!
//! - [`EventFlags`] - A plain flag group for code that runs in a single context, for
//!   example next to a `soft_timer` registry in a main loop.
//! - [`AtomicEventFlags`] - A flag group that can be shared with interrupt handlers or other
//!   threads.
//!
//! # Examples
//!
//! ```
//! use event_flags::{EventFlags, Receive};
//!
//! const BUTTON: u32 = 1 << 0;
//! const TIMER: u32 = 1 << 1;
//!
//! let mut events = EventFlags::new();
//! events.send(BUTTON);
//!
//! // both are required, nothing is consumed
//! assert_eq!(events.recv(BUTTON | TIMER, Receive::all().and_clear()), None);
//! assert_eq!(events.get(), BUTTON);
//!
//! events.send(TIMER);
//! assert_eq!(events.recv(BUTTON | TIMER, Receive::all().and_clear()), Some(BUTTON | TIMER));
//! assert!(events.is_empty());
//! ```

mod atomic;
mod flags;
mod receive;

pub use atomic::AtomicEventFlags;
pub use flags::EventFlags;
pub use receive::{Receive, Wait};
