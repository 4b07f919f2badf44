//! Bounded in-memory record of resolved state changes.
//!
//! Each machine keeps a small ring of its most recent transitions for
//! diagnostics; nothing is persisted across restarts.

use crate::core::event::Event;
use crate::core::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of records kept per machine.
pub const DEFAULT_TRACE_CAPACITY: usize = 64;

/// Record of a single resolved state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: StateId,
    pub to: StateId,
    /// The event that triggered the move.
    pub event: Event,
    pub timestamp: DateTime<Utc>,
}

/// Ring of the most recent transitions of one machine.
///
/// Capacity-bounded: once full, recording a new transition discards the
/// oldest record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionTrace {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl TransitionTrace {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a state change, stamped with the current time.
    pub fn push(&mut self, from: StateId, to: StateId, event: Event) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(TransitionRecord {
            from,
            to,
            event,
            timestamp: Utc::now(),
        });
    }

    /// Records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for TransitionTrace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut trace = TransitionTrace::new();
        trace.push(StateId(0), StateId(1), Event::local(0));
        trace.push(StateId(1), StateId(2), Event::local(1));

        let path: Vec<(StateId, StateId)> = trace.records().map(|r| (r.from, r.to)).collect();
        assert_eq!(path, vec![(StateId(0), StateId(1)), (StateId(1), StateId(2))]);
        assert_eq!(trace.last().unwrap().to, StateId(2));
    }

    #[test]
    fn discards_oldest_when_full() {
        let mut trace = TransitionTrace::with_capacity(2);
        trace.push(StateId(0), StateId(1), Event::local(0));
        trace.push(StateId(1), StateId(2), Event::local(0));
        trace.push(StateId(2), StateId(0), Event::local(0));

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.records().next().unwrap().from, StateId(1));
    }

    #[test]
    fn serializes_to_json() {
        let mut trace = TransitionTrace::new();
        trace.push(StateId(0), StateId(1), Event::TICK_5S);

        let json = serde_json::to_string(&trace).unwrap();
        let back: TransitionTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.last().unwrap().event, Event::TICK_5S);
    }
}
