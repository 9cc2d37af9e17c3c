// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// The external 32-bit tick counter that drives a [`TimerRegistry`][crate::TimerRegistry].
///
/// A tick source is a zero-argument function returning the current tick. The counter must be
/// monotonic modulo 2<sup>32</sup> and is advanced only by the application, for example by a
/// periodic interrupt or by an explicit increment in a polling loop. What one tick means is
/// up to the application.
///
/// # Cloning and shared state
///
/// Cloning a tick source is inexpensive (an `Arc` clone) and every clone reads the same
/// underlying counter.
///
/// # Testing
///
/// With the `test-util` feature enabled, a tick source can be created from a
/// [`TickControl`][crate::TickControl], which lets tests move the counter by hand.
///
/// # Examples
///
/// ## From a closure
///
/// ```
/// use soft_timer::TickSource;
///
/// let source = TickSource::new(|| 42);
/// assert_eq!(source.now(), 42);
/// ```
///
/// ## From a counter advanced by an interrupt handler
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use soft_timer::TickSource;
///
/// let counter = Arc::new(AtomicU32::new(0));
/// let source = TickSource::from_counter(Arc::clone(&counter));
///
/// // e.g. inside the periodic interrupt
/// counter.fetch_add(1, Ordering::Relaxed);
///
/// assert_eq!(source.now(), 1);
/// ```
#[derive(Clone)]
pub struct TickSource(TickSourceRepr);

#[derive(Clone)]
enum TickSourceRepr {
    Callback(Arc<dyn Fn() -> u32 + Send + Sync>),
    Counter(Arc<AtomicU32>),
    #[cfg(any(feature = "test-util", test))]
    Control(crate::TickControl),
}

impl TickSource {
    /// Creates a tick source that calls `read` whenever the current tick is needed.
    pub fn new<F>(read: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        Self(TickSourceRepr::Callback(Arc::new(read)))
    }

    /// Creates a tick source that reads a shared atomic counter.
    ///
    /// The counter is read with relaxed ordering; the single context that polls the registry
    /// only needs to observe a monotonic value.
    #[must_use]
    pub fn from_counter(counter: Arc<AtomicU32>) -> Self {
        Self(TickSourceRepr::Counter(counter))
    }

    #[cfg(any(feature = "test-util", test))]
    pub(crate) fn with_control(control: &crate::TickControl) -> Self {
        Self(TickSourceRepr::Control(control.clone()))
    }

    /// Reads the current tick.
    #[must_use]
    pub fn now(&self) -> u32 {
        match &self.0 {
            TickSourceRepr::Callback(read) => read(),
            TickSourceRepr::Counter(counter) => counter.load(Ordering::Relaxed),
            #[cfg(any(feature = "test-util", test))]
            TickSourceRepr::Control(control) => control.read(),
        }
    }
}

impl fmt::Debug for TickSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            TickSourceRepr::Callback(_) => f.write_str("TickSource::Callback"),
            TickSourceRepr::Counter(counter) => f.debug_tuple("TickSource::Counter").field(counter).finish(),
            #[cfg(any(feature = "test-util", test))]
            TickSourceRepr::Control(control) => f.debug_tuple("TickSource::Control").field(control).finish(),
        }
    }
}

impl From<Arc<AtomicU32>> for TickSource {
    fn from(counter: Arc<AtomicU32>) -> Self {
        Self::from_counter(counter)
    }
}
