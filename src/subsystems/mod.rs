//! Domain machines built on the FSM engine.
//!
//! Every subsystem shares the Unknown -> Active / Inactive shape: entry into
//! Unknown probes the underlying facility and self-sends Start or Stop, and
//! the two reachable states carry the periodic work on their tick
//! self-transitions. The machines own no engine logic; each module only
//! declares a table and its context.

pub mod bus;
pub mod climate;
pub mod motion;
pub mod network;
pub mod proximity;

use crate::core::{Event, StateId};

/// Machine-local start event shared by every subsystem shape.
pub const EVENT_START: Event = Event::local(0);
/// Machine-local stop event shared by every subsystem shape.
pub const EVENT_STOP: Event = Event::local(1);

/// Initial state of every subsystem machine.
pub const UNKNOWN: StateId = StateId(0);
pub const ACTIVE: StateId = StateId(1);
pub const INACTIVE: StateId = StateId(2);
