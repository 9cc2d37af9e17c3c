// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{Arc, Mutex};

use crate::TickSource;

/// Controls the tick counter in tests.
///
/// This is useful for testing timer-driven code without wiring up an interrupt or a real
/// time base. `TickControl` is available when the `test-util` feature is enabled.
///
/// To create a [`TickSource`] from `TickControl`, use the [`TickControl::to_tick_source`]
/// method. Every tick source created from the same control (and every clone of the control)
/// observes the same counter.
///
/// # Examples
///
/// ## Advancing ticks manually
///
/// ```
/// use soft_timer::TickControl;
///
/// let control = TickControl::new();
/// let source = control.to_tick_source();
///
/// assert_eq!(source.now(), 0);
/// control.advance(5);
/// assert_eq!(source.now(), 5);
/// ```
///
/// ## Advancing ticks automatically
///
/// ```
/// use soft_timer::TickControl;
///
/// let source = TickControl::new().auto_advance(1).to_tick_source();
///
/// assert_eq!(source.now(), 0);
/// assert_eq!(source.now(), 1);
/// ```
///
/// # Production code and `TickControl`
///
/// Never enable the `test-util` feature in production code. Only enable it for
/// `dev-dependencies`:
///
/// ```toml
/// soft_timer = { version = "*", features = ["test-util"] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TickControl {
    /// Tests may move the counter from a different thread than the one polling the registry.
    state: Arc<Mutex<State>>,
}

impl TickControl {
    /// Creates a new `TickControl` whose counter starts at zero and does not auto-advance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `TickControl` whose counter starts at `ticks`.
    ///
    /// # Examples
    ///
    /// ```
    /// use soft_timer::TickControl;
    ///
    /// let control = TickControl::new_at(u32::MAX);
    /// control.advance(1);
    /// assert_eq!(control.now(), 0);
    /// ```
    #[must_use]
    pub fn new_at(ticks: u32) -> Self {
        let this = Self::new();
        this.advance_to(ticks);
        this
    }

    /// Converts the `TickControl` to a [`TickSource`].
    #[must_use]
    pub fn to_tick_source(&self) -> TickSource {
        TickSource::with_control(self)
    }

    /// Sets the number of ticks the counter advances after every read through a tick source.
    ///
    /// Reads through [`TickControl::now`] do not auto-advance.
    #[must_use]
    pub fn auto_advance(self, ticks: u32) -> Self {
        self.with_state(|s| s.auto_advance = ticks);
        self
    }

    /// Advances the counter by `ticks`, wrapping at `u32::MAX`.
    pub fn advance(&self, ticks: u32) {
        self.with_state(|s| s.ticks = s.ticks.wrapping_add(ticks));
    }

    /// Moves the counter to `ticks`.
    ///
    /// The counter may be moved backwards; that breaks the monotonic contract of a tick
    /// source and is only meant for setting up a test.
    pub fn advance_to(&self, ticks: u32) {
        self.with_state(|s| s.ticks = ticks);
    }

    /// Returns the current tick without auto-advancing.
    #[must_use]
    pub fn now(&self) -> u32 {
        self.with_state(|s| s.ticks)
    }

    pub(crate) fn read(&self) -> u32 {
        self.with_state(State::read)
    }

    fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut State) -> R,
    {
        f(&mut self.state.lock().expect("acquiring lock must always succeed"))
    }
}

impl From<TickControl> for TickSource {
    fn from(control: TickControl) -> Self {
        control.to_tick_source()
    }
}

impl From<&TickControl> for TickSource {
    fn from(control: &TickControl) -> Self {
        control.to_tick_source()
    }
}

#[derive(Debug, Default)]
struct State {
    ticks: u32,
    auto_advance: u32,
}

impl State {
    fn read(&mut self) -> u32 {
        let ticks = self.ticks;
        self.ticks = self.ticks.wrapping_add(self.auto_advance);
        ticks
    }
}
