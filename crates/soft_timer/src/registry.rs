// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::builder::RegistryOptions;
use crate::{Error, RegistryBuilder, ReschedulePolicy, Result, TickSource, TimeoutCallback, Timer, TimerMode, TimerState, telemetry, ticks};

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(0);

/// A handle to a timer registered with a [`TimerRegistry`].
///
/// Handles are cheap to copy and are checked on every use. A handle goes stale once its timer
/// is detached or deleted; operations on a stale handle, or on a handle issued by a different
/// registry, fail with [`ErrorKind::NotFound`][crate::ErrorKind::NotFound]. A stale handle
/// never addresses a timer registered later in the same storage: every slot hands out each
/// generation at most once and is retired after its last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    registry: u32,
    index: u32,
    generation: u32,
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.registry, self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    /// Registered with `init`; the caller takes the timer back with `detach`.
    Static,
    /// Registered with `create`; the registry may drop it on `delete`.
    Dynamic,
}

impl Ownership {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

struct Entry<U> {
    timer: Timer<U>,
    ownership: Ownership,
    prev: Option<u32>,
    next: Option<u32>,
}

struct Slot<U> {
    generation: u32,
    entry: Option<Entry<U>>,
}

/// An ordered collection of software timers driven by one [`TickSource`].
///
/// The registry owns the membership list of its timers. Timers are registered with
/// [`init`](Self::init) or [`create`](Self::create), controlled through the returned
/// [`TimerId`] and fired by [`poll`](Self::poll), which the application calls periodically
/// from a single context.
///
/// Multiple registries can coexist, each bound to its own tick source. Handles are tied to the
/// registry that issued them.
///
/// # Timer lifecycle
///
/// Every timer is in one of three [states](TimerState):
///
/// * [`Stopped`](TimerState::Stopped) after registration and after [`stop`](Self::stop).
/// * [`Running`](TimerState::Running) after [`start`](Self::start), [`restart`](Self::restart)
///   or [`resume`](Self::resume).
/// * [`Timeout`](TimerState::Timeout) after expiring without being rescheduled.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use soft_timer::{TickSource, Timer, TimerMode, TimerRegistry, TimerState};
///
/// let ticks = Arc::new(AtomicU32::new(0));
/// let mut registry: TimerRegistry = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));
///
/// let id = registry.create(Timer::new())?;
/// registry.start(id, TimerMode::Loop, 5)?;
///
/// ticks.store(5, Ordering::Relaxed);
/// assert_eq!(registry.poll(), 1);
/// assert_eq!(registry.state(id)?, TimerState::Running);
/// assert_eq!(registry.deadline(id)?, 10);
///
/// registry.delete(id)?;
/// assert!(registry.is_empty());
/// # Ok::<(), soft_timer::Error>(())
/// ```
pub struct TimerRegistry<U = ()> {
    id: u32,
    tick_source: TickSource,
    options: RegistryOptions,
    slots: Vec<Slot<U>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
    /// Reused between polls to hold the membership snapshot.
    pub(crate) scratch: Vec<TimerId>,
}

impl<U> TimerRegistry<U> {
    /// Returns a builder for a registry with non-default settings.
    #[must_use]
    pub fn builder() -> RegistryBuilder<U> {
        RegistryBuilder::new()
    }

    /// Creates an empty registry with default settings, driven by `tick_source`.
    #[must_use]
    pub fn new(tick_source: impl Into<TickSource>) -> Self {
        Self::with_options(tick_source.into(), RegistryOptions::default())
    }

    pub(crate) fn with_options(tick_source: TickSource, options: RegistryOptions) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            tick_source,
            options,
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            scratch: Vec::new(),
        }
    }

    /// Registers a caller-owned timer at the end of the membership list.
    ///
    /// The scheduling state of the timer is reset; it starts out stopped. Take the timer back
    /// with [`detach`](Self::detach).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Exhausted`][crate::ErrorKind::Exhausted] if the registry is full.
    pub fn init(&mut self, timer: Timer<U>) -> Result<TimerId> {
        self.insert(timer, Ownership::Static)
    }

    /// Registers a timer whose storage the registry manages.
    ///
    /// Behaves like [`init`](Self::init), but the timer may also be dropped in place with
    /// [`delete`](Self::delete).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Unsupported`][crate::ErrorKind::Unsupported] if dynamic creation
    /// is disabled for this registry and [`ErrorKind::Exhausted`][crate::ErrorKind::Exhausted]
    /// if the registry is full.
    pub fn create(&mut self, timer: Timer<U>) -> Result<TimerId> {
        if !self.options.dynamic_creation {
            return Err(rejected("create", Error::unsupported("dynamic creation is disabled")));
        }

        self.insert(timer, Ownership::Dynamic)
    }

    fn insert(&mut self, mut timer: Timer<U>, ownership: Ownership) -> Result<TimerId> {
        if let Some(capacity) = self.options.capacity
            && self.len >= capacity
        {
            return Err(rejected("insert", Error::exhausted(capacity)));
        }

        timer.reset();
        let entry = Entry {
            timer,
            ownership,
            prev: self.tail,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => index,
            None => self.grow()?,
        };

        let Some(slot) = self.slots.get_mut(index as usize) else {
            return Err(Error::exhausted(self.len));
        };
        slot.entry = Some(entry);
        let generation = slot.generation;

        match self.tail.and_then(|tail| self.entry_at_mut(tail)) {
            Some(tail) => tail.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        let id = TimerId {
            registry: self.id,
            index,
            generation,
        };
        telemetry::timer_inserted(id, ownership.as_str(), self.len);
        Ok(id)
    }

    /// Appends an empty slot and returns its index.
    fn grow(&mut self) -> Result<u32> {
        let index = u32::try_from(self.slots.len()).map_err(|_overflow| rejected("insert", Error::exhausted(self.len)))?;
        self.slots
            .try_reserve(1)
            .map_err(|_alloc| rejected("insert", Error::exhausted(self.len)))?;
        self.slots.push(Slot {
            generation: 0,
            entry: None,
        });
        Ok(index)
    }

    /// Removes a timer from the registry and returns it.
    ///
    /// After `detach` returns, no subsequent [`poll`](Self::poll) invokes the callback of the
    /// timer and `id` is stale. The returned timer keeps its callback, user data and the
    /// scheduling state it had when it was detached, except that a timer detached from within
    /// its own callback comes back without a callback.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or
    /// foreign, for example when detaching the same timer twice. The registry is unchanged in
    /// that case.
    pub fn detach(&mut self, id: TimerId) -> Result<Timer<U>> {
        let entry = self.unlink(id).ok_or_else(|| rejected("detach", Error::not_found()))?;

        let mut timer = entry.timer;
        timer.settle_callback();
        Ok(timer)
    }

    /// Removes a timer registered with [`create`](Self::create) and drops it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign
    /// and [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] if the timer was
    /// registered with [`init`](Self::init). In the latter case the timer stays registered.
    pub fn delete(&mut self, id: TimerId) -> Result<()> {
        let entry = self.entry(id).ok_or_else(|| rejected("delete", Error::not_found()))?;

        if entry.ownership == Ownership::Static {
            return Err(rejected(
                "delete",
                Error::invalid_argument("timer is owned by the caller, use detach instead"),
            ));
        }

        drop(self.unlink(id));
        Ok(())
    }

    /// Removes and drops every timer.
    pub fn clear(&mut self) {
        drop(self.drain());
    }

    /// Removes every timer and returns them in membership order.
    pub fn drain(&mut self) -> Vec<Timer<U>> {
        let ids: Vec<_> = self.ids().collect();

        ids.into_iter().filter_map(|id| self.detach(id).ok()).collect()
    }

    fn unlink(&mut self, id: TimerId) -> Option<Entry<U>> {
        self.entry(id)?;

        let slot = self.slots.get_mut(id.index as usize)?;
        let entry = slot.entry.take()?;

        // a slot whose generations are used up is retired, so stale handles never alias
        if let Some(generation) = slot.generation.checked_add(1) {
            slot.generation = generation;
            self.free.push(id.index);
        }

        match entry.prev.and_then(|prev| self.entry_at_mut(prev)) {
            Some(prev) => prev.next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next.and_then(|next| self.entry_at_mut(next)) {
            Some(next) => next.prev = entry.prev,
            None => self.tail = entry.prev,
        }
        self.len -= 1;

        telemetry::timer_detached(id, self.len);
        Some(entry)
    }

    /// Returns the number of registered timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no timers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `id` refers to a timer of this registry.
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.entry(id).is_some()
    }

    /// Returns the handles of all registered timers in membership order.
    pub fn ids(&self) -> impl Iterator<Item = TimerId> + '_ {
        let mut cursor = self.head;

        std::iter::from_fn(move || {
            let index = cursor?;
            let slot = self.slots.get(index as usize)?;
            let entry = slot.entry.as_ref()?;
            cursor = entry.next;

            Some(TimerId {
                registry: self.id,
                index,
                generation: slot.generation,
            })
        })
    }

    /// Returns a registered timer for inspection.
    #[must_use]
    pub fn get(&self, id: TimerId) -> Option<&Timer<U>> {
        self.entry(id).map(|entry| &entry.timer)
    }

    /// Returns the tick source that drives the registry.
    #[must_use]
    pub fn tick_source(&self) -> &TickSource {
        &self.tick_source
    }

    /// Reads the current tick from the tick source.
    #[must_use]
    pub fn now(&self) -> u32 {
        self.tick_source.now()
    }

    /// Returns when repeating timers are rescheduled relative to their callback.
    #[must_use]
    pub fn reschedule_policy(&self) -> ReschedulePolicy {
        self.options.reschedule
    }

    /// Returns the maximum number of timers, if limited.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.options.capacity
    }

    /// Returns `true` if [`create`](Self::create) is offered.
    #[must_use]
    pub fn dynamic_creation(&self) -> bool {
        self.options.dynamic_creation
    }

    /// Starts a timer that fires `interval` ticks from now.
    ///
    /// Sets the mode and interval, arms the deadline and puts the timer in
    /// [`Running`](TimerState::Running). Starting a running timer re-arms it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] if `interval`
    /// is zero or not below [`ticks::HALF_RANGE`], leaving the timer untouched, and
    /// [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn start(&mut self, id: TimerId, mode: TimerMode, interval: u32) -> Result<()> {
        if interval == 0 {
            return Err(rejected("start", Error::invalid_argument("interval must be greater than zero")));
        }

        // a deadline half the tick space away or more would already count as due
        if interval >= ticks::HALF_RANGE {
            return Err(rejected("start", Error::invalid_argument("interval must be below 2^31 ticks")));
        }

        let now = self.tick_source.now();
        let timer = self.timer_mut(id, "start")?;
        timer.configure(mode, interval);
        timer.arm(now);

        telemetry::timer_started(id, mode, interval, timer.deadline());
        Ok(())
    }

    /// Stops a timer. Its deadline and interval are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        self.timer_mut(id, "stop")?.disarm(TimerState::Stopped);
        Ok(())
    }

    /// Re-enables a timer against its existing deadline.
    ///
    /// The deadline is not recomputed, so the time the timer spent stopped still counts
    /// towards it. A timer whose deadline passed while it was stopped fires on the next
    /// [`poll`](Self::poll).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
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
    /// let mut registry: TimerRegistry = TimerRegistry::new(TickSource::from_counter(Arc::clone(&ticks)));
    /// let id = registry.create(Timer::new())?;
    ///
    /// registry.start(id, TimerMode::Single, 10)?;
    /// registry.stop(id)?;
    ///
    /// ticks.store(50, Ordering::Relaxed);
    /// registry.resume(id)?;
    ///
    /// // the deadline at tick 10 already passed
    /// assert_eq!(registry.poll(), 1);
    /// # Ok::<(), soft_timer::Error>(())
    /// ```
    pub fn resume(&mut self, id: TimerId) -> Result<()> {
        self.timer_mut(id, "resume")?.resume();
        Ok(())
    }

    /// Re-arms a timer `interval` ticks from now, using its stored mode and interval.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] if the timer
    /// was never started, leaving it untouched, and [`ErrorKind::NotFound`][crate::ErrorKind::NotFound]
    /// if `id` is stale or foreign.
    pub fn restart(&mut self, id: TimerId) -> Result<()> {
        let now = self.tick_source.now();
        let timer = self.timer_mut(id, "restart")?;

        if !timer.arm(now) {
            return Err(rejected("restart", Error::invalid_argument("timer was never started")));
        }

        telemetry::timer_started(id, timer.mode(), timer.interval(), timer.deadline());
        Ok(())
    }

    /// Returns the mode of a timer.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn mode(&self, id: TimerId) -> Result<TimerMode> {
        self.timer(id).map(Timer::mode)
    }

    /// Returns the state of a timer.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn state(&self, id: TimerId) -> Result<TimerState> {
        self.timer(id).map(Timer::state)
    }

    /// Returns `true` if a timer participates in expiry checks.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn is_enabled(&self, id: TimerId) -> Result<bool> {
        self.timer(id).map(Timer::is_enabled)
    }

    /// Returns the interval a timer was last started with.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn interval(&self, id: TimerId) -> Result<u32> {
        self.timer(id).map(Timer::interval)
    }

    /// Returns the absolute tick at which a timer is due.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn deadline(&self, id: TimerId) -> Result<u32> {
        self.timer(id).map(Timer::deadline)
    }

    /// Returns the ticks left until a timer is due, zero if it is due, or `None` if it is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn remaining(&self, id: TimerId) -> Result<Option<u32>> {
        let timer = self.timer(id)?;
        let now = self.tick_source.now();

        Ok(timer.is_enabled().then(|| ticks::remaining(now, timer.deadline())))
    }

    /// Returns the user data of a timer.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn user_data(&self, id: TimerId) -> Result<Option<&U>> {
        self.timer(id).map(Timer::user_data)
    }

    /// Returns the user data of a timer mutably.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn user_data_mut(&mut self, id: TimerId) -> Result<Option<&mut U>> {
        self.timer_mut(id, "user_data_mut").map(Timer::user_data_mut)
    }

    /// Replaces the timeout callback of a timer.
    ///
    /// A callback may replace itself; the replacement is used from the next expiry on.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn set_callback<F>(&mut self, id: TimerId, callback: F) -> Result<()>
    where
        F: FnMut(&mut crate::Expired<'_, U>) + Send + 'static,
    {
        let callback: TimeoutCallback<U> = Box::new(callback);
        self.timer_mut(id, "set_callback")?.set_callback(Some(callback));
        Ok(())
    }

    /// Removes the timeout callback of a timer. The timer keeps expiring without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`][crate::ErrorKind::NotFound] if `id` is stale or foreign.
    pub fn clear_callback(&mut self, id: TimerId) -> Result<()> {
        self.timer_mut(id, "clear_callback")?.set_callback(None);
        Ok(())
    }

    fn timer(&self, id: TimerId) -> Result<&Timer<U>> {
        self.get(id).ok_or_else(Error::not_found)
    }

    fn timer_mut(&mut self, id: TimerId, operation: &'static str) -> Result<&mut Timer<U>> {
        self.find_mut(id).ok_or_else(|| rejected(operation, Error::not_found()))
    }

    /// Looks up a member timer without reporting a missing one.
    pub(crate) fn find_mut(&mut self, id: TimerId) -> Option<&mut Timer<U>> {
        self.entry_mut(id).map(|entry| &mut entry.timer)
    }

    fn entry(&self, id: TimerId) -> Option<&Entry<U>> {
        if id.registry != self.id {
            return None;
        }

        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: TimerId) -> Option<&mut Entry<U>> {
        if id.registry != self.id {
            return None;
        }

        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn entry_at_mut(&mut self, index: u32) -> Option<&mut Entry<U>> {
        self.slots.get_mut(index as usize).and_then(|slot| slot.entry.as_mut())
    }
}

impl<U> fmt::Debug for TimerRegistry<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("id", &self.id)
            .field("tick_source", &self.tick_source)
            .field("len", &self.len)
            .field("reschedule", &self.options.reschedule)
            .field("capacity", &self.options.capacity)
            .field("dynamic_creation", &self.options.dynamic_creation)
            .finish_non_exhaustive()
    }
}

fn rejected(operation: &'static str, error: Error) -> Error {
    telemetry::timer_rejected(operation, &error);
    error
}
