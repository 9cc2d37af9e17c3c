// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::collections::vec_deque;
use std::iter::FusedIterator;

use crate::{Error, ErrorKind, Full, Result};

/// Determines what happens when a full [`RingQueue`] receives another element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overflow {
    /// The push fails and the value is handed back to the caller.
    #[default]
    Reject,

    /// The oldest element is dropped to make room for the new one.
    OverwriteOldest,
}

impl Overflow {
    /// Returns a short `snake_case` name of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::OverwriteOldest => "overwrite_oldest",
        }
    }
}

/// A first-in, first-out queue with a fixed capacity.
///
/// The storage for all elements is allocated when the queue is created; pushing never
/// allocates. Elements leave the queue in the order they were pushed, regardless of how often
/// the internal storage has wrapped around.
///
/// # Examples
///
/// Keeping the three most recent samples:
///
/// ```
/// use ring_queue::RingQueue;
///
/// let mut samples = RingQueue::with_overwrite(3)?;
///
/// for sample in 1..=5 {
///     samples.push(sample).unwrap();
/// }
///
/// assert_eq!(samples.pop_multi(10), vec![3, 4, 5]);
/// # Ok::<(), ring_queue::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RingQueue<T> {
    elements: VecDeque<T>,
    capacity: usize,
    overflow: Overflow,
}

impl<T> RingQueue<T> {
    /// Creates an empty queue that holds up to `capacity` elements.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize, overflow: Overflow) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::from(ErrorKind::ZeroCapacity));
        }

        Ok(Self {
            elements: VecDeque::with_capacity(capacity),
            capacity,
            overflow,
        })
    }

    /// Creates an empty queue that drops its oldest element when full.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ZeroCapacity`] if `capacity` is zero.
    pub fn with_overwrite(capacity: usize) -> Result<Self> {
        Self::new(capacity, Overflow::OverwriteOldest)
    }

    /// Appends a value at the back of the queue.
    ///
    /// # Errors
    ///
    /// Returns the value in [`Full`] if the queue is full and its policy is
    /// [`Overflow::Reject`]. With [`Overflow::OverwriteOldest`] the push always succeeds.
    pub fn push(&mut self, value: T) -> std::result::Result<(), Full<T>> {
        if self.is_full() {
            match self.overflow {
                Overflow::Reject => return Err(Full(value)),
                Overflow::OverwriteOldest => {
                    drop(self.elements.pop_front());
                    report_overwrite(self.capacity);
                }
            }
        }

        self.elements.push_back(value);
        Ok(())
    }

    /// Removes and returns the element at the front of the queue.
    pub fn pop(&mut self) -> Option<T> {
        self.elements.pop_front()
    }

    /// Returns the element at the front of the queue without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.elements.front()
    }

    /// Drops the element at the front of the queue. Returns `false` if the queue was empty.
    pub fn remove(&mut self) -> bool {
        self.elements.pop_front().is_some()
    }

    /// Pushes values in order until the first one is rejected and returns how many were
    /// pushed.
    ///
    /// The rejected value is dropped and the rest of `values` is not consumed.
    pub fn push_multi<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut pushed = 0;

        for value in values {
            if self.push(value).is_err() {
                break;
            }
            pushed += 1;
        }

        pushed
    }

    /// Removes up to `count` elements from the front of the queue.
    pub fn pop_multi(&mut self, count: usize) -> Vec<T> {
        let count = count.min(self.elements.len());
        self.elements.drain(..count).collect()
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Returns the number of queued elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the queue holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns `true` if the queue holds `capacity` elements.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.elements.len() >= self.capacity
    }

    /// Returns the maximum number of elements the queue holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns what happens when the queue is full.
    #[must_use]
    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Returns an iterator over the queued elements from front to back.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter(self.elements.iter())
    }
}

impl<'a, T> IntoIterator for &'a RingQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the elements of a [`RingQueue`], from front to back.
///
/// Created by [`RingQueue::iter`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T>(vec_deque::Iter<'a, T>);

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg_attr(not(any(feature = "logs", test)), expect(unused_variables, reason = "only consumed by log events"))]
fn report_overwrite(capacity: usize) {
    #[cfg(any(feature = "logs", test))]
    tracing::event!(
        name: "ring_queue.overwrite",
        tracing::Level::TRACE,
        queue.capacity = capacity,
        queue.overflow = Overflow::OverwriteOldest.as_str(),
    );
}
