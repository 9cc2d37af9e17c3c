// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::marker::PhantomData;

use crate::{Error, Result, TickSource, TimerRegistry};

/// Determines when a [`Loop`][crate::TimerMode::Loop] timer is rescheduled relative to its
/// callback.
///
/// The two policies are observably different to a callback that inspects its own timer, so
/// the choice is part of a registry's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReschedulePolicy {
    /// The next deadline is armed before the callback runs. The callback observes its timer
    /// [`Running`][crate::TimerState::Running] with the next deadline already set.
    ///
    /// This is the default.
    #[default]
    BeforeCallback,

    /// The next deadline is armed after the callback returns. The callback observes its timer
    /// in [`Timeout`][crate::TimerState::Timeout] with no next deadline armed.
    ///
    /// The timer is only rescheduled if the callback left it registered and in `Timeout`; a
    /// callback that stops, restarts or starts its own timer takes precedence.
    AfterCallback,
}

impl ReschedulePolicy {
    /// Returns a short `snake_case` name of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeCallback => "before_callback",
            Self::AfterCallback => "after_callback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RegistryOptions {
    pub(crate) reschedule: ReschedulePolicy,
    pub(crate) capacity: Option<usize>,
    pub(crate) dynamic_creation: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            reschedule: ReschedulePolicy::default(),
            capacity: None,
            dynamic_creation: true,
        }
    }
}

/// Builds a [`TimerRegistry`].
///
/// Created by [`TimerRegistry::builder`]. Every registry needs a [`TickSource`]; all other
/// settings are optional.
///
/// # Examples
///
/// ```
/// use soft_timer::{ReschedulePolicy, TickSource, TimerRegistry};
///
/// let registry: TimerRegistry = TimerRegistry::builder()
///     .tick_source(TickSource::new(|| 0))
///     .reschedule(ReschedulePolicy::AfterCallback)
///     .capacity(16)
///     .build()?;
///
/// assert_eq!(registry.capacity(), Some(16));
/// # Ok::<(), soft_timer::Error>(())
/// ```
///
/// A registry without a tick source cannot be built:
///
/// ```
/// use soft_timer::{ErrorKind, TimerRegistry};
///
/// let error = TimerRegistry::<()>::builder().build().unwrap_err();
/// assert!(matches!(error.kind(), ErrorKind::InvalidArgument(_)));
/// ```
#[derive(Debug)]
pub struct RegistryBuilder<U = ()> {
    tick_source: Option<TickSource>,
    options: RegistryOptions,
    _user_data: PhantomData<fn() -> U>,
}

impl<U> RegistryBuilder<U> {
    /// Creates a builder with default settings and no tick source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_source: None,
            options: RegistryOptions::default(),
            _user_data: PhantomData,
        }
    }

    /// Sets the tick source that drives the registry.
    #[must_use]
    pub fn tick_source(mut self, tick_source: impl Into<TickSource>) -> Self {
        self.tick_source = Some(tick_source.into());
        self
    }

    /// Sets the tick source from a function returning the current tick.
    #[must_use]
    pub fn tick_fn<F>(self, read: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        self.tick_source(TickSource::new(read))
    }

    /// Sets when repeating timers are rescheduled relative to their callback.
    ///
    /// Defaults to [`ReschedulePolicy::BeforeCallback`].
    #[must_use]
    pub fn reschedule(mut self, policy: ReschedulePolicy) -> Self {
        self.options.reschedule = policy;
        self
    }

    /// Limits the number of timers the registry holds at once.
    ///
    /// Registering a timer beyond the limit fails with
    /// [`ErrorKind::Exhausted`][crate::ErrorKind::Exhausted]. Unlimited by default.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.options.capacity = Some(capacity);
        self
    }

    /// Determines whether [`TimerRegistry::create`] is offered.
    ///
    /// When disabled, only caller-owned timers registered with [`TimerRegistry::init`] are
    /// accepted and `create` fails with [`ErrorKind::Unsupported`][crate::ErrorKind::Unsupported].
    /// Enabled by default.
    #[must_use]
    pub fn dynamic_creation(mut self, enabled: bool) -> Self {
        self.options.dynamic_creation = enabled;
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] if no tick
    /// source was set or the capacity is zero.
    pub fn build(self) -> Result<TimerRegistry<U>> {
        let Some(tick_source) = self.tick_source else {
            return Err(Error::invalid_argument("a tick source is required"));
        };

        if self.options.capacity == Some(0) {
            return Err(Error::invalid_argument("capacity must be greater than zero"));
        }

        Ok(TimerRegistry::with_options(tick_source, self.options))
    }
}

impl<U> Default for RegistryBuilder<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, TickControl};

    static_assertions::assert_impl_all!(RegistryBuilder<std::rc::Rc<u8>>: Send, Sync);

    #[test]
    fn defaults_ok() {
        let options = RegistryOptions::default();

        assert_eq!(options.reschedule, ReschedulePolicy::BeforeCallback);
        assert_eq!(options.capacity, None);
        assert!(options.dynamic_creation);
    }

    #[test]
    fn build_without_tick_source_fails() {
        let error = RegistryBuilder::<()>::new().build().unwrap_err();

        assert_eq!(
            error.kind(),
            &ErrorKind::InvalidArgument("a tick source is required".into())
        );
    }

    #[test]
    fn build_with_zero_capacity_fails() {
        let error = RegistryBuilder::<()>::new().tick_fn(|| 0).capacity(0).build().unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn build_applies_options() {
        let control = TickControl::new_at(9);
        let registry = RegistryBuilder::<()>::default()
            .tick_source(&control)
            .reschedule(ReschedulePolicy::AfterCallback)
            .capacity(4)
            .dynamic_creation(false)
            .build()
            .unwrap();

        assert_eq!(registry.reschedule_policy(), ReschedulePolicy::AfterCallback);
        assert_eq!(registry.capacity(), Some(4));
        assert!(!registry.dynamic_creation());
        assert_eq!(registry.now(), 9);
    }

    #[test]
    fn policy_names() {
        assert_eq!(ReschedulePolicy::BeforeCallback.as_str(), "before_callback");
        assert_eq!(ReschedulePolicy::AfterCallback.as_str(), "after_callback");
    }
}
