//! Event codes routed through machine queues.
//!
//! Codes below [`GLOBAL_EVENT_SPAN`] are the shared periodic ticks the
//! orchestrator fans out to every machine. Codes at or above it are local to
//! one machine; uniqueness is per machine, not global, so two machines may
//! reuse the same local code for unrelated meanings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of event codes reserved for the shared periodic ticks.
pub const GLOBAL_EVENT_SPAN: u16 = 3;

/// An event code.
///
/// # Example
///
/// ```rust
/// use devloop::core::Event;
///
/// const START: Event = Event::local(0);
///
/// assert!(Event::TICK_1S.is_tick());
/// assert!(!START.is_tick());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Event(u16);

impl Event {
    /// The 500 ms periodic tick.
    pub const TICK_500MS: Event = Event(0);
    /// The 1 s periodic tick.
    pub const TICK_1S: Event = Event(1);
    /// The 5 s periodic tick.
    pub const TICK_5S: Event = Event(2);

    /// Machine-local event at the given offset above the tick range.
    pub const fn local(offset: u16) -> Event {
        Event(GLOBAL_EVENT_SPAN + offset)
    }

    /// The raw event code.
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Whether this is one of the shared periodic ticks.
    pub const fn is_tick(self) -> bool {
        self.0 < GLOBAL_EVENT_SPAN
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Event::TICK_500MS => write!(f, "tick/500ms"),
            Event::TICK_1S => write!(f, "tick/1s"),
            Event::TICK_5S => write!(f, "tick/5s"),
            Event(code) => write!(f, "local/{}", code - GLOBAL_EVENT_SPAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_sit_below_the_local_range() {
        assert!(Event::TICK_500MS.is_tick());
        assert!(Event::TICK_1S.is_tick());
        assert!(Event::TICK_5S.is_tick());
        assert_eq!(Event::TICK_5S.code(), GLOBAL_EVENT_SPAN - 1);
    }

    #[test]
    fn local_events_are_offset_past_the_ticks() {
        let start = Event::local(0);
        let stop = Event::local(1);

        assert!(!start.is_tick());
        assert_eq!(start.code(), GLOBAL_EVENT_SPAN);
        assert_ne!(start, stop);
    }

    #[test]
    fn display_names_ticks_and_locals() {
        assert_eq!(Event::TICK_1S.to_string(), "tick/1s");
        assert_eq!(Event::local(4).to_string(), "local/4");
    }

    #[test]
    fn events_round_trip_through_serde() {
        let event = Event::local(2);
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
