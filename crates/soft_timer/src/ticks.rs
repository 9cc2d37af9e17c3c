// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Wraparound-safe arithmetic over the 32-bit tick counter.
//!
//! The tick counter wraps modulo 2<sup>32</sup>. Deadlines are compared by unsigned
//! subtraction: the tick space is treated as a circle split into an "already due" half and a
//! "not yet due" half relative to the current tick. A naive `now >= deadline` comparison is
//! wrong as soon as the counter wraps past `u32::MAX`.
//!
//! # Examples
//!
//! ```
//! use soft_timer::ticks;
//!
//! let deadline = ticks::deadline_after(0xFFFF_FFE0, 16);
//! assert_eq!(deadline, 0xFFFF_FFF0);
//!
//! assert!(!ticks::is_due(0xFFFF_FFEF, deadline));
//! assert!(ticks::is_due(0xFFFF_FFF0, deadline));
//!
//! // still due after the counter wrapped
//! assert!(ticks::is_due(0x0000_0005, deadline));
//! ```

/// Half of the 32-bit tick space (2<sup>31</sup>).
///
/// A deadline is due when fewer than this many ticks have elapsed since it. Deadlines further
/// away than this are indistinguishable from deadlines in the past, which bounds the longest
/// usable interval.
pub const HALF_RANGE: u32 = 1 << 31;

/// Computes the absolute deadline `interval` ticks after `now`, wrapping at `u32::MAX`.
#[must_use]
pub const fn deadline_after(now: u32, interval: u32) -> u32 {
    now.wrapping_add(interval)
}

/// Returns the number of ticks elapsed since `deadline`, modulo 2<sup>32</sup>.
#[must_use]
pub const fn elapsed_since(now: u32, deadline: u32) -> u32 {
    now.wrapping_sub(deadline)
}

/// Determines whether `deadline` has been reached at tick `now`.
#[must_use]
pub const fn is_due(now: u32, deadline: u32) -> bool {
    elapsed_since(now, deadline) < HALF_RANGE
}

/// Returns the ticks left until `deadline`, or zero if it is already due.
#[must_use]
pub const fn remaining(now: u32, deadline: u32) -> u32 {
    if is_due(now, deadline) { 0 } else { deadline.wrapping_sub(now) }
}
