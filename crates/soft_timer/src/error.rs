// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

/// The result type for fallible operations that use the [`Error`] type of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error returned by [`TimerRegistry`][crate::TimerRegistry] operations.
///
/// Errors fall into a few categories, described by [`ErrorKind`]:
///
/// * Misuse, such as starting a timer with a zero interval or building a registry without a
///   tick source.
/// * Stale handles, such as detaching the same timer twice or addressing a deleted timer.
/// * Resource exhaustion when the registry cannot accept more timers.
///
/// None of these are fatal to the registry; it is left unchanged and the caller decides
/// how to react.
///
/// # Examples
///
/// ```
/// use soft_timer::{ErrorKind, TickSource, Timer, TimerMode, TimerRegistry};
///
/// let mut registry: TimerRegistry = TimerRegistry::new(TickSource::new(|| 0));
/// let id = registry.create(Timer::new())?;
///
/// let error = registry.start(id, TimerMode::Single, 0).unwrap_err();
/// assert!(matches!(error.kind(), ErrorKind::InvalidArgument(_)));
/// # Ok::<(), soft_timer::Error>(())
/// ```
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] ErrorKind);

/// The category of an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The caller supplied an invalid argument or called an operation out of sequence.
    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    /// The timer handle does not refer to a member of this registry.
    ///
    /// This is the outcome of detaching a timer twice, using a handle after the timer was
    /// deleted, or passing a handle issued by a different registry.
    #[error("timer is not registered")]
    NotFound,

    /// The registry cannot hold any more timers.
    #[error("timer registry is full (capacity {capacity})")]
    Exhausted {
        /// The number of timers the registry was able to hold.
        capacity: usize,
    },

    /// The operation is not offered by this registry.
    #[error("unsupported operation: {0}")]
    Unsupported(Cow<'static, str>),
}

impl Error {
    pub(crate) const fn from_kind(kind: ErrorKind) -> Self {
        Self(kind)
    }

    pub(crate) fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::from_kind(ErrorKind::InvalidArgument(message.into()))
    }

    pub(crate) const fn not_found() -> Self {
        Self::from_kind(ErrorKind::NotFound)
    }

    pub(crate) const fn exhausted(capacity: usize) -> Self {
        Self::from_kind(ErrorKind::Exhausted { capacity })
    }

    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Self::from_kind(ErrorKind::Unsupported(message.into()))
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Returns `true` if the error was caused by a stale or foreign timer handle.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.0, ErrorKind::NotFound)
    }
}
