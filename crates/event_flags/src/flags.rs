// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::Receive;

/// A group of 32 event flags owned by a single context.
///
/// # Examples
///
/// ```
/// use event_flags::{EventFlags, Receive};
///
/// let mut events = EventFlags::new();
/// events.send(0b0101);
///
/// // any of the requested bits, consume what was received
/// assert_eq!(events.recv(0b0011, Receive::any().and_clear()), Some(0b0001));
/// assert_eq!(events.get(), 0b0100);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventFlags {
    set: u32,
}

impl EventFlags {
    /// Creates a group with no bits set.
    #[must_use]
    pub const fn new() -> Self {
        Self { set: 0 }
    }

    /// Creates a group with `bits` already set.
    #[must_use]
    pub const fn with_bits(bits: u32) -> Self {
        Self { set: bits }
    }

    /// Sets `bits`. Bits that are already set stay set.
    pub fn send(&mut self, bits: u32) {
        self.set |= bits;
    }

    /// Checks for `bits` according to `receive`.
    ///
    /// On success returns the requested bits that were set and, if [`Receive::clear`] is
    /// set, clears the requested bits. Returns `None` and changes nothing otherwise.
    pub fn recv(&mut self, bits: u32, receive: Receive) -> Option<u32> {
        let (received, remaining) = receive.apply(self.set, bits)?;
        self.set = remaining;
        Some(received)
    }

    /// Returns the bits currently set.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.set
    }

    /// Returns `true` if every bit of `bits` is set.
    #[must_use]
    pub const fn is_set(&self, bits: u32) -> bool {
        self.set & bits == bits
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.set == 0
    }

    /// Clears `bits` without checking them.
    pub fn clear(&mut self, bits: u32) {
        self.set &= !bits;
    }

    /// Clears every bit and returns the bits that were set.
    pub fn clear_all(&mut self) -> u32 {
        std::mem::take(&mut self.set)
    }
}

impl fmt::Debug for EventFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventFlags").field(&format_args!("{:#034b}", self.set)).finish()
    }
}

impl From<u32> for EventFlags {
    fn from(bits: u32) -> Self {
        Self::with_bits(bits)
    }
}

impl From<EventFlags> for u32 {
    fn from(flags: EventFlags) -> Self {
        flags.set
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Wait;

    static_assertions::assert_impl_all!(EventFlags: Send, Sync, Copy, Default, fmt::Debug);

    #[test]
    fn send_accumulates() {
        let mut events = EventFlags::new();

        events.send(0b0001);
        events.send(0b0100);
        events.send(0b0001);

        assert_eq!(events.get(), 0b0101);
        assert!(events.is_set(0b0101));
        assert!(!events.is_set(0b0011));
    }

    #[test]
    fn failed_recv_changes_nothing() {
        let mut events = EventFlags::with_bits(0b0001);

        assert_eq!(events.recv(0b0011, Receive::all().and_clear()), None);
        assert_eq!(events.get(), 0b0001);
    }

    #[test]
    fn recv_without_clear_keeps_bits() {
        let mut events = EventFlags::with_bits(0b0011);

        assert_eq!(events.recv(0b0010, Receive::all()), Some(0b0010));
        assert_eq!(events.recv(0b0010, Receive::all()), Some(0b0010));
        assert_eq!(events.get(), 0b0011);
    }

    #[test]
    fn recv_with_clear_consumes_once() {
        let mut events = EventFlags::with_bits(0b0110);
        let receive = Receive {
            wait: Wait::Any,
            clear: true,
        };

        assert_eq!(events.recv(0b0010, receive), Some(0b0010));
        assert_eq!(events.recv(0b0010, receive), None);
        assert_eq!(events.get(), 0b0100);
    }

    #[test]
    fn clearing() {
        let mut events = EventFlags::from(0b1111);

        events.clear(0b0101);
        assert_eq!(u32::from(events), 0b1010);

        assert_eq!(events.clear_all(), 0b1010);
        assert!(events.is_empty());
    }

    #[test]
    fn debug_output() {
        assert_eq!(
            format!("{:?}", EventFlags::with_bits(0b101)),
            "EventFlags(0b00000000000000000000000000000101)"
        );
    }
}
