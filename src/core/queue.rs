//! Bounded FIFO of pending events for one machine.

use crate::core::event::Event;
use std::collections::VecDeque;
use thiserror::Error;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Returned when a send would exceed the queue's capacity.
///
/// The caller may retry after the next drain or drop the event; the queue
/// itself is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("event queue full ({0} pending events)")]
pub struct QueueFull(pub usize);

/// Ordered sequence of pending events, FIFO, capacity-bounded.
///
/// Overflow is reported, never silently swallowed: [`EventQueue::send`] on a
/// full queue fails with [`QueueFull`] without mutating the contents.
///
/// # Example
///
/// ```rust
/// use devloop::core::{Event, EventQueue};
///
/// let mut queue = EventQueue::with_capacity(2);
/// queue.send(Event::TICK_1S).unwrap();
/// queue.send(Event::TICK_5S).unwrap();
/// assert!(queue.send(Event::TICK_500MS).is_err());
/// assert_eq!(queue.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct EventQueue {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventQueue {
    /// Empty queue with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Empty queue with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, preserving arrival order.
    pub fn send(&mut self, event: Event) -> Result<(), QueueFull> {
        if self.events.len() >= self.capacity {
            return Err(QueueFull(self.capacity));
        }
        self.events.push_back(event);
        Ok(())
    }

    /// Remove and return the oldest pending event.
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Discard all pending events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
