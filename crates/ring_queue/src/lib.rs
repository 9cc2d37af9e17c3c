// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, reason = "allow these lints in tests to improve the readability of the tests")
)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A fixed-capacity FIFO queue.
//!
//! [`RingQueue`] stores up to a fixed number of elements chosen at construction. What happens
//! when a full queue receives another element is determined by its [`Overflow`] policy:
//!
//! - [`Overflow::Reject`] - The push fails and the value is handed back in [`Full`].
//! - [`Overflow::OverwriteOldest`] - The oldest element is dropped to make room, keeping the
//!   freshest elements. Useful for sample buffers where stale data has no value.
//!
//! # Examples
//!
//! ```
//! use ring_queue::{Overflow, RingQueue};
//!
//! let mut queue = RingQueue::new(2, Overflow::Reject)?;
//!
//! queue.push('a').unwrap();
//! queue.push('b').unwrap();
//! assert!(queue.push('c').is_err());
//!
//! assert_eq!(queue.pop(), Some('a'));
//! assert_eq!(queue.peek(), Some(&'b'));
//! # Ok::<(), ring_queue::Error>(())
//! ```
//!
//! # Features
//!
//! - **`logs`** (default) - Emits a [`tracing`](https://docs.rs/tracing) event whenever an
//!   element is dropped to make room.

mod error;
mod queue;
#[cfg(test)]
mod testing;

pub use error::{Error, ErrorKind, Full, Result};
pub use queue::{Iter, Overflow, RingQueue};
