//! The FSM engine.
//!
//! A [`Machine`] owns one state table, the current state, a bounded event
//! queue and the domain's context value, and resolves one event at a time.
//! [`MachineCell`] wraps a machine in a shared single-threaded handle and
//! implements the object-safe [`Subsystem`] trait, which is how the
//! orchestrator and other machines' actions reach it.
//!
//! # Failure policy
//!
//! Sending to a full queue and a failing action are reported to the
//! immediate caller and never retried by the engine. If a cross-state
//! transition's exit action succeeded but the destination's entry action
//! failed, the machine is neither cleanly in the old state nor the new one:
//! it latches a fault, keeps the source state id, and refuses further
//! resolution with [`FsmError::Faulted`] until [`Machine::recover`] (stay in
//! the source state) or [`Machine::initialize`] (full reset) is called.

use crate::core::{
    ActionError, Event, EventQueue, QueueFull, StateDef, StateId, TransitionTrace,
};
use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Errors surfaced by machine operations.
#[derive(Debug, Error)]
pub enum FsmError {
    /// The queue is at capacity; the send left the machine untouched.
    #[error(transparent)]
    QueueFull(#[from] QueueFull),

    /// Normal "queue empty" signal, not a failure.
    #[error("no pending events")]
    NoEvents,

    /// An entry, exit or transition action reported failure.
    #[error("transition failed in state '{state}': {source}")]
    TransitionFailed {
        state: &'static str,
        #[source]
        source: ActionError,
    },

    /// A cross-state transition failed after its exit action ran; the
    /// machine refuses events until recovered or re-initialized.
    #[error("machine '{0}' is faulted and needs recovery")]
    Faulted(&'static str),

    /// The machine was reached through its own handle while resolving an
    /// event. Actions self-send through their queue argument instead.
    #[error("machine '{0}' is already resolving an event")]
    Reentrant(&'static str),
}

/// What `handle_event` did with the popped event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No transition in the current state matched; the event was consumed
    /// with no state change.
    Ignored(Event),
    /// The matched edge targets the current state: only its own action ran,
    /// entry/exit were not invoked.
    SelfTransition(Event),
    /// Exit then entry ran and the current state moved.
    Transitioned {
        event: Event,
        from: StateId,
        to: StateId,
    },
}

/// One machine instance: a state table bound to a context value.
///
/// Built by [`crate::builder::MachineBuilder`], which validates the table, so
/// every destination id is a valid index from here on. The table itself never
/// mutates; the current state and the queue are the only mutable fields and
/// only `initialize`/`send`/`handle_event` (and the actions running inside
/// them) touch them.
pub struct Machine<C> {
    name: &'static str,
    states: Vec<StateDef<C>>,
    current: StateId,
    queue: EventQueue,
    ctx: C,
    trace: TransitionTrace,
    faulted: bool,
}

impl<C> std::fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("states", &self.states.len())
            .field("current", &self.current)
            .field("faulted", &self.faulted)
            .finish_non_exhaustive()
    }
}

impl<C> Machine<C> {
    pub(crate) fn new(
        name: &'static str,
        states: Vec<StateDef<C>>,
        ctx: C,
        queue_capacity: usize,
    ) -> Self {
        Self {
            name,
            states,
            current: StateId(0),
            queue: EventQueue::with_capacity(queue_capacity),
            ctx,
            trace: TransitionTrace::new(),
            faulted: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn current_state_name(&self) -> &'static str {
        self.states[self.current.0].name
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn trace(&self) -> &TransitionTrace {
        &self.trace
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Reset to the initial state and synchronously run its entry action.
    ///
    /// Clears the queue and any fault latch first, so this doubles as the
    /// full recovery path. The entry action runs exactly once; its events, if
    /// any, are left queued for the next drain.
    pub fn initialize(&mut self) -> Result<(), FsmError> {
        self.queue.clear();
        self.current = StateId(0);
        self.faulted = false;
        debug!(
            "{}: initializing in state '{}'",
            self.name, self.states[0].name
        );
        if let Some(entry) = self.states[0].entry.clone() {
            if let Err(source) = entry(&mut self.ctx, &mut self.queue) {
                warn!("{}: initial entry failed: {}", self.name, source);
                return Err(FsmError::TransitionFailed {
                    state: self.states[0].name,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Append an event to the queue.
    ///
    /// Never triggers resolution; the current state is untouched even on
    /// `QueueFull`.
    pub fn send(&mut self, event: Event) -> Result<(), FsmError> {
        self.queue.send(event)?;
        trace!("{}: queued {}", self.name, event);
        Ok(())
    }

    /// Pop the oldest queued event and resolve it against the current
    /// state's transition list, in declaration order.
    pub fn handle_event(&mut self) -> Result<Outcome, FsmError> {
        if self.faulted {
            return Err(FsmError::Faulted(self.name));
        }
        let event = self.queue.pop().ok_or(FsmError::NoEvents)?;
        let from = self.current;

        let Some(position) = self.states[from.0]
            .transitions
            .iter()
            .position(|t| t.event == event)
        else {
            trace!(
                "{}: {} ignored in state '{}'",
                self.name,
                event,
                self.states[from.0].name
            );
            return Ok(Outcome::Ignored(event));
        };

        let (to, edge_action) = {
            let transition = &self.states[from.0].transitions[position];
            (transition.destination, transition.action.clone())
        };

        if to == from {
            if let Some(action) = edge_action {
                if let Err(source) = action(&mut self.ctx, &mut self.queue) {
                    warn!(
                        "{}: self-transition action failed in '{}': {}",
                        self.name, self.states[from.0].name, source
                    );
                    return Err(FsmError::TransitionFailed {
                        state: self.states[from.0].name,
                        source,
                    });
                }
            }
            return Ok(Outcome::SelfTransition(event));
        }

        if let Some(exit) = self.states[from.0].exit.clone() {
            if let Err(source) = exit(&mut self.ctx, &mut self.queue) {
                // Nothing of the move happened yet; the machine stays usable.
                warn!(
                    "{}: exit of '{}' failed: {}",
                    self.name, self.states[from.0].name, source
                );
                return Err(FsmError::TransitionFailed {
                    state: self.states[from.0].name,
                    source,
                });
            }
        }
        if let Some(entry) = self.states[to.0].entry.clone() {
            if let Err(source) = entry(&mut self.ctx, &mut self.queue) {
                // Exit already ran: the machine is in neither state cleanly.
                self.faulted = true;
                warn!(
                    "{}: entry of '{}' failed after exit of '{}'; machine faulted",
                    self.name, self.states[to.0].name, self.states[from.0].name
                );
                return Err(FsmError::TransitionFailed {
                    state: self.states[to.0].name,
                    source,
                });
            }
        }

        self.current = to;
        self.trace.push(from, to, event);
        info!(
            "{}: '{}' -> '{}' on {}",
            self.name, self.states[from.0].name, self.states[to.0].name, event
        );
        Ok(Outcome::Transitioned { event, from, to })
    }

    /// Handle events until the queue reports empty.
    ///
    /// Stops at the first non-`NoEvents` error; remaining events stay queued.
    pub fn drain(&mut self) -> Result<(), FsmError> {
        loop {
            match self.handle_event() {
                Ok(_) => {}
                Err(FsmError::NoEvents) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    /// Clear a fault latch, leaving the machine in the source state of the
    /// failed transition. [`Machine::initialize`] is the full reset.
    pub fn recover(&mut self) {
        if self.faulted {
            info!(
                "{}: fault cleared in state '{}'",
                self.name,
                self.current_state_name()
            );
        }
        self.faulted = false;
    }
}

/// Object-safe view of a machine, used by the orchestrator and by other
/// machines' actions.
pub trait Subsystem {
    fn name(&self) -> &'static str;
    fn initialize(&self) -> Result<(), FsmError>;
    fn send(&self, event: Event) -> Result<(), FsmError>;
    fn handle_event(&self) -> Result<Outcome, FsmError>;
    fn is_faulted(&self) -> bool;
    fn recover(&self);

    /// Handle events until the queue reports empty, stopping at the first
    /// non-`NoEvents` error.
    fn drain(&self) -> Result<(), FsmError> {
        loop {
            match self.handle_event() {
                Ok(_) => {}
                Err(FsmError::NoEvents) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }
}

/// Shared single-threaded handle to a machine.
///
/// Machines have process lifetime and are owned here rather than in hidden
/// globals; contexts of other machines hold clones of this handle for
/// cross-machine sends. Reaching a machine through its own handle while it
/// is resolving reports [`FsmError::Reentrant`] instead of aborting; a
/// machine's own actions self-send through their queue argument.
pub struct MachineCell<C> {
    name: &'static str,
    inner: Rc<RefCell<Machine<C>>>,
}

impl<C> Clone for MachineCell<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C> MachineCell<C> {
    pub fn new(machine: Machine<C>) -> Self {
        Self {
            name: machine.name(),
            inner: Rc::new(RefCell::new(machine)),
        }
    }

    /// Run a closure against the machine for typed inspection.
    pub fn with<R>(&self, f: impl FnOnce(&Machine<C>) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// Run a closure with mutable access to the machine.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Machine<C>) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    /// Type-erased handle for registration and cross-machine wiring.
    pub fn handle(&self) -> Rc<dyn Subsystem>
    where
        C: 'static,
    {
        Rc::new(self.clone())
    }
}

impl<C> Subsystem for MachineCell<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn initialize(&self) -> Result<(), FsmError> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| FsmError::Reentrant(self.name))?
            .initialize()
    }

    fn send(&self, event: Event) -> Result<(), FsmError> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| FsmError::Reentrant(self.name))?
            .send(event)
    }

    fn handle_event(&self) -> Result<Outcome, FsmError> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| FsmError::Reentrant(self.name))?
            .handle_event()
    }

    fn is_faulted(&self) -> bool {
        self.inner.borrow().is_faulted()
    }

    fn recover(&self) {
        self.inner.borrow_mut().recover();
    }
}
