// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use crate::{ReschedulePolicy, TimerId, TimerMode, TimerRegistry, TimerState, telemetry};

impl<U> TimerRegistry<U> {
    /// Fires every timer whose deadline has been reached and returns how many fired.
    ///
    /// `poll` reads the tick source once and visits each timer that was registered when the
    /// scan began, in registration order. An enabled timer is due when fewer than
    /// 2<sup>31</sup> ticks have elapsed since its deadline (see [`ticks::is_due`][crate::ticks::is_due]),
    /// which keeps the comparison correct across wraparound of the tick counter.
    ///
    /// A due timer is disabled and put in [`Timeout`](TimerState::Timeout). Its callback, if
    /// any, is invoked synchronously. [`Loop`](TimerMode::Loop) timers are rescheduled
    /// `interval` ticks after the current tick, before or after the callback depending on the
    /// registry's [`ReschedulePolicy`]. [`Single`](TimerMode::Single) timers stay in `Timeout`
    /// until started again.
    ///
    /// Callbacks may freely operate on the registry. Timers detached or deleted by a callback
    /// are skipped if not yet visited; timers registered by a callback are first visited by
    /// the next `poll`.
    ///
    /// `poll` never blocks and runs in time linear in the number of registered timers.
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
    /// let mut registry: TimerRegistry<u32> = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));
    ///
    /// let id = registry.create(Timer::new().with_user_data(0).with_callback(|expired| {
    ///     if let Some(count) = expired.user_data_mut() {
    ///         *count += 1;
    ///     }
    /// }))?;
    /// registry.start(id, TimerMode::Loop, 5)?;
    ///
    /// for tick in 1..=20 {
    ///     ticks.store(tick, Ordering::Relaxed);
    ///     registry.poll();
    /// }
    ///
    /// assert_eq!(registry.user_data(id)?, Some(&4));
    /// # Ok::<(), soft_timer::Error>(())
    /// ```
    pub fn poll(&mut self) -> usize {
        let now = self.now();

        // A callback that polls re-entrantly finds the scratch buffer taken and uses its own.
        let mut snapshot = mem::take(&mut self.scratch);
        snapshot.clear();
        snapshot.extend(self.ids());

        let mut fired = 0;
        for &id in &snapshot {
            if self.expire(id, now) {
                fired += 1;
            }
        }

        snapshot.clear();
        self.scratch = snapshot;
        fired
    }

    /// Fires a single timer if it is still a member and due at `now`.
    fn expire(&mut self, id: TimerId, now: u32) -> bool {
        let policy = self.reschedule_policy();

        let Some(timer) = self.find_mut(id) else {
            return false;
        };

        if !timer.is_due(now) {
            return false;
        }

        timer.disarm(TimerState::Timeout);
        let mode = timer.mode();
        let callback = timer.take_callback();

        telemetry::timer_expired(id, mode, now);

        if mode == TimerMode::Loop && policy == ReschedulePolicy::BeforeCallback {
            self.reschedule(id);
        }

        if let Some(mut callback) = callback {
            callback(&mut Expired {
                registry: &mut *self,
                id,
                now,
            });

            if let Some(timer) = self.find_mut(id) {
                timer.return_callback(callback);
            }
        }

        if mode == TimerMode::Loop && policy == ReschedulePolicy::AfterCallback {
            let untouched = self.find_mut(id).is_some_and(|timer| timer.state() == TimerState::Timeout);
            if untouched {
                self.reschedule(id);
            }
        }

        true
    }

    /// Arms the next deadline of a repeating timer. A timer that was never started has no
    /// interval to repeat and stays in `Timeout`.
    #[cfg_attr(test, mutants::skip)] // skipping the re-arm makes loop timers fire on every poll
    fn reschedule(&mut self, id: TimerId) {
        let now = self.now();

        if let Some(timer) = self.find_mut(id)
            && timer.arm(now)
        {
            telemetry::timer_started(id, timer.mode(), timer.interval(), timer.deadline());
        }
    }
}

/// The context passed to a timeout callback.
///
/// `Expired` identifies the timer that fired and dereferences to the [`TimerRegistry`], so a
/// callback can start, stop, detach, delete or create timers, including its own.
///
/// # Examples
///
/// A one-shot timer that re-arms itself with a growing interval:
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use soft_timer::{TickSource, Timer, TimerMode, TimerRegistry};
///
/// let ticks = Arc::new(AtomicU32::new(0));
/// let mut registry: TimerRegistry = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));
///
/// let id = registry.create(Timer::new().with_callback(|expired| {
///     let id = expired.id();
///     let interval = expired.interval(id).unwrap_or(1);
///     let _ = expired.start(id, TimerMode::Single, interval * 2);
/// }))?;
/// registry.start(id, TimerMode::Single, 1)?;
///
/// ticks.store(1, Ordering::Relaxed);
/// registry.poll();
///
/// assert_eq!(registry.deadline(id)?, 3);
/// # Ok::<(), soft_timer::Error>(())
/// ```
pub struct Expired<'a, U = ()> {
    registry: &'a mut TimerRegistry<U>,
    id: TimerId,
    now: u32,
}

impl<U> Expired<'_, U> {
    /// Returns the handle of the timer that fired.
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Returns the tick at which the poll that fired the timer began.
    #[must_use]
    pub fn now(&self) -> u32 {
        self.now
    }

    /// Returns the user data of the timer that fired.
    ///
    /// Returns `None` if the timer has no user data or the callback already detached it.
    #[must_use]
    pub fn user_data(&self) -> Option<&U> {
        self.registry.get(self.id).and_then(crate::Timer::user_data)
    }

    /// Returns the user data of the timer that fired mutably.
    #[must_use]
    pub fn user_data_mut(&mut self) -> Option<&mut U> {
        self.registry.find_mut(self.id).and_then(crate::Timer::user_data_mut)
    }

    /// Returns the registry that fired the timer.
    #[must_use]
    pub fn registry(&mut self) -> &mut TimerRegistry<U> {
        self.registry
    }
}

impl<U> Deref for Expired<'_, U> {
    type Target = TimerRegistry<U>;

    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl<U> DerefMut for Expired<'_, U> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl<U> fmt::Debug for Expired<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expired")
            .field("id", &self.id)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}
