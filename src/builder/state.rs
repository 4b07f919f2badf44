//! Fluent builder for one state of a machine.

use crate::core::{ActionResult, Event, EventQueue, StateDef, StateId, Transition};
use std::rc::Rc;

/// Builder for a single state: name, lifecycle hooks, ordered transitions.
///
/// Transitions are matched in the order they are declared here.
pub struct StateBuilder<C> {
    def: StateDef<C>,
}

impl<C> StateBuilder<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            def: StateDef {
                name,
                entry: None,
                exit: None,
                transitions: Vec::new(),
            },
        }
    }

    /// Action run when the state is entered through a cross-state transition
    /// (or, for state 0, during `initialize`).
    pub fn on_entry<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &mut EventQueue) -> ActionResult + 'static,
    {
        self.def.entry = Some(Rc::new(action));
        self
    }

    /// Action run when the state is left through a cross-state transition.
    pub fn on_exit<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &mut EventQueue) -> ActionResult + 'static,
    {
        self.def.exit = Some(Rc::new(action));
        self
    }

    /// Plain edge: `event` moves the machine to `destination`.
    pub fn transition(mut self, event: Event, destination: StateId) -> Self {
        self.def.transitions.push(Transition {
            event,
            destination,
            action: None,
        });
        self
    }

    /// Edge with its own action. On a self-transition the edge action is the
    /// only callback that runs.
    pub fn transition_with<F>(mut self, event: Event, destination: StateId, action: F) -> Self
    where
        F: Fn(&mut C, &mut EventQueue) -> ActionResult + 'static,
    {
        self.def.transitions.push(Transition {
            event,
            destination,
            action: Some(Rc::new(action)),
        });
        self
    }

    pub(crate) fn into_def(self) -> StateDef<C> {
        self.def
    }
}
