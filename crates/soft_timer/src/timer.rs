// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::Expired;
use crate::ticks;

/// Determines what happens after a timer expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimerMode {
    /// The timer fires once and then stays in [`TimerState::Timeout`].
    Single,

    /// The timer is rescheduled with its interval every time it fires.
    #[default]
    Loop,
}

impl TimerMode {
    /// Returns a short `snake_case` name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Loop => "loop",
        }
    }
}

/// The lifecycle state of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimerState {
    /// The timer is enabled and counts down to its deadline.
    Running,

    /// The timer was never started or was stopped explicitly.
    #[default]
    Stopped,

    /// The timer expired and was not rescheduled.
    ///
    /// A [`TimerMode::Loop`] timer passes through this state while it fires and, depending
    /// on the [`ReschedulePolicy`][crate::ReschedulePolicy], may still be in it while its
    /// callback runs.
    Timeout,
}

impl TimerState {
    /// Returns a short `snake_case` name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Timeout => "timeout",
        }
    }
}

/// The callback invoked when a timer expires.
pub type TimeoutCallback<U> = Box<dyn FnMut(&mut Expired<'_, U>) + Send>;

/// One schedulable software timer.
///
/// A `Timer` is the storage of a timer while it is not registered. It carries the optional
/// timeout callback and user data and, once detached, the scheduling state it had. Register
/// it with [`TimerRegistry::init`][crate::TimerRegistry::init] or
/// [`TimerRegistry::create`][crate::TimerRegistry::create] and drive it through the
/// returned [`TimerId`][crate::TimerId].
///
/// Registering a timer resets its scheduling state: it starts out
/// [`Stopped`][TimerState::Stopped], disabled, in [`Loop`][TimerMode::Loop] mode with a zero
/// interval.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use soft_timer::{TickSource, Timer, TimerMode, TimerRegistry};
///
/// let ticks = Arc::new(AtomicU32::new(0));
/// let mut registry: TimerRegistry<&str> = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));
///
/// let fired = Arc::new(AtomicU32::new(0));
/// let fired_clone = Arc::clone(&fired);
///
/// let timer = Timer::new()
///     .with_user_data("heartbeat")
///     .with_callback(move |expired| {
///         assert_eq!(expired.user_data(), Some(&"heartbeat"));
///         fired_clone.fetch_add(1, Ordering::Relaxed);
///     });
///
/// let id = registry.init(timer)?;
/// registry.start(id, TimerMode::Single, 3)?;
///
/// ticks.store(3, Ordering::Relaxed);
/// registry.poll();
///
/// assert_eq!(fired.load(Ordering::Relaxed), 1);
///
/// let timer = registry.detach(id)?;
/// assert_eq!(timer.user_data(), Some(&"heartbeat"));
/// # Ok::<(), soft_timer::Error>(())
/// ```
pub struct Timer<U = ()> {
    enabled: bool,
    state: TimerState,
    mode: TimerMode,
    interval: u32,
    deadline: u32,
    pub(crate) callback: Callback<U>,
    user_data: Option<U>,
}

/// The callback slot of a timer.
///
/// While a callback executes it is moved out of its timer, leaving `InFlight` behind so the
/// dispatcher can tell whether the callback replaced or cleared itself.
pub(crate) enum Callback<U> {
    Absent,
    Ready(TimeoutCallback<U>),
    InFlight,
}

impl<U> Timer<U> {
    /// Creates a timer without callback or user data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: false,
            state: TimerState::Stopped,
            mode: TimerMode::Loop,
            interval: 0,
            deadline: 0,
            callback: Callback::Absent,
            user_data: None,
        }
    }

    /// Sets the callback invoked synchronously from [`poll`][crate::TimerRegistry::poll]
    /// when the timer expires.
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut Expired<'_, U>) + Send + 'static,
    {
        self.callback = Callback::Ready(Box::new(callback));
        self
    }

    /// Attaches opaque user data. The registry never interprets it.
    #[must_use]
    pub fn with_user_data(mut self, user_data: U) -> Self {
        self.user_data = Some(user_data);
        self
    }

    /// Returns `true` if the timer participates in expiry checks.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the state of the timer.
    #[must_use]
    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// Returns the mode of the timer.
    #[must_use]
    pub const fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Returns the interval, in ticks, the timer was last started with.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns the absolute tick at which the timer is due.
    ///
    /// The value is meaningful only while the timer [is enabled](Self::is_enabled).
    #[must_use]
    pub const fn deadline(&self) -> u32 {
        self.deadline
    }

    /// Returns `true` if a timeout callback is attached.
    #[must_use]
    pub const fn has_callback(&self) -> bool {
        matches!(self.callback, Callback::Ready(_))
    }

    /// Returns the attached user data.
    #[must_use]
    pub const fn user_data(&self) -> Option<&U> {
        self.user_data.as_ref()
    }

    /// Returns the attached user data mutably.
    #[must_use]
    pub fn user_data_mut(&mut self) -> Option<&mut U> {
        self.user_data.as_mut()
    }

    /// Consumes the timer and returns its user data.
    #[must_use]
    pub fn into_user_data(self) -> Option<U> {
        self.user_data
    }

    pub(crate) fn reset(&mut self) {
        self.enabled = false;
        self.state = TimerState::Stopped;
        self.mode = TimerMode::Loop;
        self.interval = 0;
        self.deadline = 0;
    }

    pub(crate) fn configure(&mut self, mode: TimerMode, interval: u32) {
        self.mode = mode;
        self.interval = interval;
    }

    /// Arms the deadline `interval` ticks after `now`. Fails without any change when the
    /// interval is zero.
    pub(crate) fn arm(&mut self, now: u32) -> bool {
        if self.interval == 0 {
            return false;
        }

        self.deadline = ticks::deadline_after(now, self.interval);
        self.enabled = true;
        self.state = TimerState::Running;
        true
    }

    /// Re-enables the timer against its existing deadline.
    pub(crate) fn resume(&mut self) {
        self.enabled = true;
        self.state = TimerState::Running;
    }

    pub(crate) fn disarm(&mut self, state: TimerState) {
        self.enabled = false;
        self.state = state;
    }

    pub(crate) fn is_due(&self, now: u32) -> bool {
        self.enabled && ticks::is_due(now, self.deadline)
    }

    pub(crate) fn set_callback(&mut self, callback: Option<TimeoutCallback<U>>) {
        self.callback = callback.map_or(Callback::Absent, Callback::Ready);
    }

    /// Moves the callback out for the duration of a dispatch.
    pub(crate) fn take_callback(&mut self) -> Option<TimeoutCallback<U>> {
        match std::mem::replace(&mut self.callback, Callback::Absent) {
            Callback::Ready(callback) => {
                self.callback = Callback::InFlight;
                Some(callback)
            }
            other => {
                self.callback = other;
                None
            }
        }
    }

    /// Puts a dispatched callback back, unless it was replaced or cleared in the meantime.
    pub(crate) fn return_callback(&mut self, callback: TimeoutCallback<U>) {
        if matches!(self.callback, Callback::InFlight) {
            self.callback = Callback::Ready(callback);
        }
    }

    /// Clears a callback slot left behind by a callback that detached its own timer.
    pub(crate) fn settle_callback(&mut self) {
        if matches!(self.callback, Callback::InFlight) {
            self.callback = Callback::Absent;
        }
    }
}

impl<U> Default for Timer<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: fmt::Debug> fmt::Debug for Timer<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("enabled", &self.enabled)
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("interval", &self.interval)
            .field("deadline", &self.deadline)
            .field("has_callback", &self.has_callback())
            .field("user_data", &self.user_data)
            .finish()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Timer<u32>: Send, Default);
    static_assertions::assert_impl_all!(TimerMode: Copy, Send, Sync);
    static_assertions::assert_impl_all!(TimerState: Copy, Send, Sync);

    #[test]
    fn new_timer_is_stopped() {
        let timer: Timer = Timer::new();

        assert!(!timer.is_enabled());
        assert_eq!(timer.state(), TimerState::Stopped);
        assert_eq!(timer.mode(), TimerMode::Loop);
        assert_eq!(timer.interval(), 0);
        assert_eq!(timer.deadline(), 0);
        assert!(!timer.has_callback());
        assert!(timer.user_data().is_none());
    }

    #[test]
    fn arm_requires_interval() {
        let mut timer: Timer = Timer::new();

        assert!(!timer.arm(10));
        assert_eq!(timer.state(), TimerState::Stopped);
        assert!(!timer.is_enabled());

        timer.configure(TimerMode::Single, 5);
        assert!(timer.arm(10));
        assert_eq!(timer.deadline(), 15);
        assert_eq!(timer.state(), TimerState::Running);
        assert!(timer.is_enabled());
    }

    #[test]
    fn disabled_timer_is_never_due() {
        let mut timer: Timer = Timer::new();
        timer.configure(TimerMode::Single, 5);
        assert!(timer.arm(0));

        assert!(timer.is_due(5));
        timer.disarm(TimerState::Stopped);
        assert!(!timer.is_due(5));

        timer.resume();
        assert!(timer.is_due(5));
        assert_eq!(timer.deadline(), 5);
    }

    #[test]
    fn reset_keeps_callback_and_user_data() {
        let mut timer = Timer::new().with_user_data(7_u32).with_callback(|_| {});
        timer.configure(TimerMode::Single, 9);
        assert!(timer.arm(1));

        timer.reset();

        assert_eq!(timer.state(), TimerState::Stopped);
        assert_eq!(timer.mode(), TimerMode::Loop);
        assert_eq!(timer.interval(), 0);
        assert!(timer.has_callback());
        assert_eq!(timer.user_data(), Some(&7));
    }

    #[test]
    fn callback_in_flight_is_restored_unless_replaced() {
        let mut timer: Timer = Timer::new().with_callback(|_| {});

        let callback = timer.take_callback().unwrap();
        assert!(!timer.has_callback());
        timer.return_callback(callback);
        assert!(timer.has_callback());

        let callback = timer.take_callback().unwrap();
        timer.set_callback(None);
        timer.return_callback(callback);
        assert!(!timer.has_callback());
    }

    #[test]
    fn take_callback_without_callback() {
        let mut timer: Timer = Timer::new();

        assert!(timer.take_callback().is_none());
        assert!(matches!(timer.callback, Callback::Absent));
    }

    #[test]
    fn settle_callback_clears_in_flight() {
        let mut timer: Timer = Timer::new().with_callback(|_| {});
        let _callback = timer.take_callback();

        timer.settle_callback();

        assert!(matches!(timer.callback, Callback::Absent));
    }

    #[test]
    fn into_user_data_returns_value() {
        let mut timer = Timer::new().with_user_data(String::from("a"));
        timer.user_data_mut().unwrap().push('b');

        assert_eq!(timer.into_user_data().as_deref(), Some("ab"));
    }

    #[test]
    fn debug_output() {
        let timer = Timer::new().with_user_data(1_u8);

        assert_eq!(
            format!("{timer:?}"),
            "Timer { enabled: false, state: Stopped, mode: Loop, interval: 0, deadline: 0, has_callback: false, user_data: Some(1) }"
        );
    }

    #[test]
    fn names() {
        assert_eq!(TimerMode::Single.as_str(), "single");
        assert_eq!(TimerMode::Loop.as_str(), "loop");
        assert_eq!(TimerState::Running.as_str(), "running");
        assert_eq!(TimerState::Stopped.as_str(), "stopped");
        assert_eq!(TimerState::Timeout.as_str(), "timeout");
    }
}
