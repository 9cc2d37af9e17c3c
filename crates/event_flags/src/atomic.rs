// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{EventFlags, Receive};

/// A group of 32 event flags that can be shared between contexts.
///
/// Every operation is a single atomic read-modify-write, so bits can be sent from an
/// interrupt handler or another thread while the main loop receives them. A receive that
/// clears bits never loses a bit sent concurrently.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use event_flags::{AtomicEventFlags, Receive};
///
/// const DATA_READY: u32 = 1 << 3;
///
/// let events = Arc::new(AtomicEventFlags::new());
/// let producer = Arc::clone(&events);
///
/// thread::spawn(move || producer.send(DATA_READY)).join().unwrap();
///
/// assert_eq!(events.recv(DATA_READY, Receive::all().and_clear()), Some(DATA_READY));
/// assert_eq!(events.get(), 0);
/// ```
#[derive(Debug, Default)]
pub struct AtomicEventFlags {
    set: AtomicU32,
}

impl AtomicEventFlags {
    /// Creates a group with no bits set.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_bits(0)
    }

    /// Creates a group with `bits` already set.
    #[must_use]
    pub const fn with_bits(bits: u32) -> Self {
        Self { set: AtomicU32::new(bits) }
    }

    /// Sets `bits`. Bits that are already set stay set.
    pub fn send(&self, bits: u32) {
        self.set.fetch_or(bits, Ordering::AcqRel);
    }

    /// Checks for `bits` according to `receive`.
    ///
    /// Behaves like [`EventFlags::recv`]; the check and the optional clear happen atomically.
    pub fn recv(&self, bits: u32, receive: Receive) -> Option<u32> {
        if !receive.clear {
            return receive
                .apply(self.set.load(Ordering::Acquire), bits)
                .map(|(received, _)| received);
        }

        // on success the previous set is the one the clear was applied to
        self.set
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |set| {
                receive.apply(set, bits).map(|(_, remaining)| remaining)
            })
            .ok()
            .and_then(|previous| receive.apply(previous, bits))
            .map(|(received, _)| received)
    }

    /// Returns the bits currently set.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.set.load(Ordering::Acquire)
    }

    /// Returns `true` if every bit of `bits` is set.
    #[must_use]
    pub fn is_set(&self, bits: u32) -> bool {
        self.get() & bits == bits
    }

    /// Clears `bits` without checking them.
    pub fn clear(&self, bits: u32) {
        self.set.fetch_and(!bits, Ordering::AcqRel);
    }

    /// Clears every bit and returns the bits that were set.
    pub fn clear_all(&self) -> u32 {
        self.set.swap(0, Ordering::AcqRel)
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> EventFlags {
        EventFlags::with_bits(self.get())
    }
}

impl From<EventFlags> for AtomicEventFlags {
    fn from(flags: EventFlags) -> Self {
        Self::with_bits(flags.get())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    static_assertions::assert_impl_all!(AtomicEventFlags: Send, Sync, Default);

    #[test]
    fn recv_matches_plain_flags() {
        let atomic = AtomicEventFlags::with_bits(0b0110);
        let mut plain = EventFlags::with_bits(0b0110);

        for (bits, receive) in [
            (0b0010, Receive::all()),
            (0b0011, Receive::all().and_clear()),
            (0b0011, Receive::any().and_clear()),
            (0b0001, Receive::any()),
        ] {
            assert_eq!(atomic.recv(bits, receive), plain.recv(bits, receive));
            assert_eq!(atomic.snapshot(), plain);
        }
    }

    #[test]
    fn failed_clearing_recv_reports_none() {
        let events = AtomicEventFlags::with_bits(0b0001);

        assert_eq!(events.recv(0b0011, Receive::all().and_clear()), None);
        assert_eq!(events.get(), 0b0001);
    }

    #[test]
    fn concurrent_senders_lose_no_bits() {
        let events = Arc::new(AtomicEventFlags::new());

        let handles: Vec<_> = (0..8)
            .map(|bit| {
                let events = Arc::clone(&events);
                thread::spawn(move || events.send(1 << bit))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(events.get(), 0xFF);
        assert!(events.is_set(0xFF));
    }

    #[test]
    fn competing_consumers_receive_bits_once() {
        for _ in 0..100 {
            let events = Arc::new(AtomicEventFlags::with_bits(0b0101));

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let events = Arc::clone(&events);
                    thread::spawn(move || events.recv(0b0101, Receive::any().and_clear()))
                })
                .collect();
            let received: Vec<_> = handles.into_iter().filter_map(|handle| handle.join().unwrap()).collect();

            assert_eq!(received, vec![0b0101]);
            assert_eq!(events.get(), 0);
        }
    }

    #[test]
    fn clear_and_clear_all() {
        let events = AtomicEventFlags::from(EventFlags::with_bits(0b1111));

        events.clear(0b0011);
        assert_eq!(events.get(), 0b1100);
        assert_eq!(events.clear_all(), 0b1100);
        assert_eq!(events.get(), 0);
    }
}
