//! Fluent builder for whole machines.

use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::core::{StateDef, StateId, DEFAULT_QUEUE_CAPACITY};
use crate::engine::Machine;

/// Builds a [`Machine`] from an ordered list of states.
///
/// The first `state` call defines the initial state (index 0). `build`
/// validates the finished table: at least one state, every destination in
/// range, no duplicate trigger within a state.
///
/// # Example
///
/// ```rust
/// use devloop::builder::{MachineBuilder, StateBuilder};
/// use devloop::core::{Event, StateId};
///
/// const FLIP: Event = Event::local(0);
///
/// let machine = MachineBuilder::new("lamp")
///     .state(StateBuilder::new("off").transition(FLIP, StateId(1)))
///     .state(StateBuilder::new("on").transition(FLIP, StateId(0)))
///     .build(())
///     .unwrap();
/// assert_eq!(machine.current_state(), StateId(0));
/// ```
pub struct MachineBuilder<C> {
    name: &'static str,
    states: Vec<StateDef<C>>,
    queue_capacity: usize,
}

impl<C> MachineBuilder<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            states: Vec::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Override the bounded queue capacity (default 32).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Append a state; its index is its [`StateId`].
    pub fn state(mut self, state: StateBuilder<C>) -> Self {
        self.states.push(state.into_def());
        self
    }

    /// Validate the table and construct the machine around `ctx`.
    ///
    /// The machine is not started: call [`Machine::initialize`] to run the
    /// initial state's entry action.
    pub fn build(self, ctx: C) -> Result<Machine<C>, BuildError> {
        if self.states.is_empty() {
            return Err(BuildError::NoStates(self.name));
        }
        for state in &self.states {
            for (index, transition) in state.transitions.iter().enumerate() {
                if transition.destination.0 >= self.states.len() {
                    return Err(BuildError::InvalidDestination {
                        machine: self.name,
                        state: state.name,
                        destination: transition.destination,
                    });
                }
                let duplicated = state.transitions[..index]
                    .iter()
                    .any(|earlier| earlier.event == transition.event);
                if duplicated {
                    return Err(BuildError::DuplicateTrigger {
                        machine: self.name,
                        state: state.name,
                        event: transition.event,
                    });
                }
            }
        }
        Ok(Machine::new(self.name, self.states, ctx, self.queue_capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Event;

    const GO: Event = Event::local(0);

    #[test]
    fn empty_table_is_rejected() {
        let result = MachineBuilder::<()>::new("empty").build(());
        assert_eq!(result.unwrap_err(), BuildError::NoStates("empty"));
    }

    #[test]
    fn out_of_range_destination_is_rejected() {
        let result = MachineBuilder::new("bad")
            .state(StateBuilder::<()>::new("only").transition(GO, StateId(7)))
            .build(());

        assert_eq!(
            result.unwrap_err(),
            BuildError::InvalidDestination {
                machine: "bad",
                state: "only",
                destination: StateId(7),
            }
        );
    }

    #[test]
    fn duplicate_trigger_is_rejected() {
        let result = MachineBuilder::new("dup")
            .state(
                StateBuilder::<()>::new("only")
                    .transition(GO, StateId(0))
                    .transition(GO, StateId(0)),
            )
            .build(());

        assert_eq!(
            result.unwrap_err(),
            BuildError::DuplicateTrigger {
                machine: "dup",
                state: "only",
                event: GO,
            }
        );
    }

    #[test]
    fn well_formed_table_builds() {
        let machine = MachineBuilder::new("ok")
            .state(StateBuilder::<()>::new("a").transition(GO, StateId(1)))
            .state(StateBuilder::<()>::new("b").transition(GO, StateId(0)))
            .queue_capacity(8)
            .build(())
            .unwrap();

        assert_eq!(machine.name(), "ok");
        assert_eq!(machine.current_state(), StateId(0));
        assert_eq!(machine.pending_events(), 0);
    }
}
