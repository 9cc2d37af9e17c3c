// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// The result type for fallible operations that use the [`Error`] type of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error returned when a [`RingQueue`][crate::RingQueue] cannot be created.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] ErrorKind);

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

/// The category of an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A queue must be able to hold at least one element.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
}

/// A value that was rejected because the queue is full.
///
/// Returned by [`RingQueue::push`][crate::RingQueue::push] when the queue uses
/// [`Overflow::Reject`][crate::Overflow::Reject]. The rejected value is handed back.
///
/// # Examples
///
/// ```
/// use ring_queue::{Full, Overflow, RingQueue};
///
/// let mut queue = RingQueue::new(1, Overflow::Reject)?;
/// queue.push("first").unwrap();
///
/// let Full(rejected) = queue.push("second").unwrap_err();
/// assert_eq!(rejected, "second");
/// # Ok::<(), ring_queue::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the rejected value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}
