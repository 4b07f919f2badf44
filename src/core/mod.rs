//! Core data model of the runtime.
//!
//! This module contains plain data, no resolution logic:
//! - Event codes and the global/local split
//! - The bounded per-machine event queue
//! - State and transition tables with their action callbacks
//! - The bounded transition trace
//!
//! The engine in [`crate::engine`] owns instances of these types and is the
//! only code that mutates them after construction.

pub mod event;
pub mod queue;
pub mod state;
pub mod trace;

pub use event::{Event, GLOBAL_EVENT_SPAN};
pub use queue::{EventQueue, QueueFull, DEFAULT_QUEUE_CAPACITY};
pub use state::{Action, ActionError, ActionResult, StateDef, StateId, Transition};
pub use trace::{TransitionRecord, TransitionTrace, DEFAULT_TRACE_CAPACITY};
