// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Which of the requested bits must be set for a receive to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wait {
    /// Every requested bit must be set.
    All,

    /// At least one requested bit must be set.
    Any,
}

/// The options of a receive: how the requested bits are matched and whether the matched bits
/// are consumed.
///
/// # Examples
///
/// ```
/// use event_flags::{Receive, Wait};
///
/// let receive = Receive::any().and_clear();
///
/// assert_eq!(receive, Receive { wait: Wait::Any, clear: true });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Receive {
    /// How the requested bits are matched.
    pub wait: Wait,

    /// Whether the requested bits are cleared after a successful receive.
    pub clear: bool,
}

impl Receive {
    /// Matches when every requested bit is set. Does not clear.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            wait: Wait::All,
            clear: false,
        }
    }

    /// Matches when at least one requested bit is set. Does not clear.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            wait: Wait::Any,
            clear: false,
        }
    }

    /// Clears the requested bits after a successful receive.
    #[must_use]
    pub const fn and_clear(mut self) -> Self {
        self.clear = true;
        self
    }

    /// Evaluates the receive against `set` and returns the received bits and the state that
    /// remains, or `None` if the condition does not hold.
    ///
    /// Requesting no bits succeeds for [`Wait::All`] and fails for [`Wait::Any`].
    pub(crate) const fn apply(self, set: u32, bits: u32) -> Option<(u32, u32)> {
        let matched = match self.wait {
            Wait::All => set & bits == bits,
            Wait::Any => set & bits != 0,
        };

        if !matched {
            return None;
        }

        let remaining = if self.clear { set & !bits } else { set };
        Some((set & bits, remaining))
    }
}
