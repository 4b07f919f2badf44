//! States, transitions and the action callbacks they carry.
//!
//! A machine's state table is plain data built once at construction: each
//! state holds optional entry/exit hooks and an ordered transition list, and
//! never changes afterwards. Actions are reference-counted closures rather
//! than raw function pointers, so domain code can capture its context
//! handles.

use crate::core::event::Event;
use crate::core::queue::{EventQueue, QueueFull};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Failure reported by an entry, exit or transition action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ActionError(String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        ActionError(message.into())
    }
}

impl From<QueueFull> for ActionError {
    fn from(err: QueueFull) -> Self {
        ActionError(err.to_string())
    }
}

/// Result of running an action.
pub type ActionResult = Result<(), ActionError>;

/// An entry, exit or transition callback.
///
/// The queue argument is the owning machine's queue; an action self-sends by
/// pushing onto it instead of re-borrowing the machine. Self-sends are
/// resolved in the same drain pass because every drain runs to `NoEvents`.
pub type Action<C> = Rc<dyn Fn(&mut C, &mut EventQueue) -> ActionResult>;

/// Index of a state in its machine's table. Index 0 is the initial state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StateId(pub usize);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One edge of a state's transition table.
///
/// The triggering event must be unique within the state; the builder rejects
/// duplicates so resolution stays deterministic.
pub struct Transition<C> {
    pub event: Event,
    pub destination: StateId,
    pub action: Option<Action<C>>,
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            event: self.event,
            destination: self.destination,
            action: self.action.clone(),
        }
    }
}

/// One state: lifecycle hooks plus an ordered transition list.
pub struct StateDef<C> {
    pub name: &'static str,
    pub entry: Option<Action<C>>,
    pub exit: Option<Action<C>>,
    pub transitions: Vec<Transition<C>>,
}

impl<C> Clone for StateDef<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entry: self.entry.clone(),
            exit: self.exit.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_error_from_queue_full_keeps_the_message() {
        let err: ActionError = QueueFull(32).into();
        assert_eq!(err.to_string(), "event queue full (32 pending events)");
    }

    #[test]
    fn state_id_displays_as_index() {
        assert_eq!(StateId(2).to_string(), "#2");
    }

    #[test]
    fn transitions_share_their_action_on_clone() {
        let action: Action<u32> = Rc::new(|ctx, _queue| {
            *ctx += 1;
            Ok(())
        });
        let transition = Transition {
            event: Event::local(0),
            destination: StateId(1),
            action: Some(action),
        };

        let copy = transition.clone();
        let original = transition.action.unwrap();
        let cloned = copy.action.unwrap();
        assert!(Rc::ptr_eq(&original, &cloned));
    }
}
