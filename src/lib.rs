//! Devloop: a cooperative finite state machine runtime for device
//! controllers.
//!
//! One shared, generic FSM engine coordinates several independent subsystem
//! lifecycles: each machine is a table of states and transitions with
//! entry/exit hooks and a bounded event queue, and a tick orchestrator fans
//! periodic events out to every registered machine at a fixed cadence, then
//! drains each queue completely.
//!
//! # Core concepts
//!
//! - **Event**: an integer code; ticks are global, everything else is
//!   machine-local ([`core::Event`])
//! - **Machine**: one engine instance bound to a static transition table
//!   ([`engine::Machine`], built with [`builder::MachineBuilder`])
//! - **Tick**: a periodic event (500 ms / 1 s / 5 s) generated by the
//!   [`orchestrator::Orchestrator`]
//! - **Subsystems**: the domain machines in [`subsystems`], wired to
//!   hardware and network facilities through the [`capability`] traits
//!
//! The runtime is single-threaded by design: machines and handles are
//! `Rc`-based and resolution is strictly sequential. The one exception is
//! the motion hysteresis gate, which is shared with an interrupt-style
//! producer behind `Arc` and a short critical section.
//!
//! # Example
//!
//! ```rust
//! use devloop::builder::{MachineBuilder, StateBuilder};
//! use devloop::core::{Event, StateId};
//!
//! const FLIP: Event = Event::local(0);
//! const OFF: StateId = StateId(0);
//! const ON: StateId = StateId(1);
//!
//! let mut machine = MachineBuilder::new("lamp")
//!     .state(StateBuilder::new("off").transition(FLIP, ON))
//!     .state(StateBuilder::new("on").transition(FLIP, OFF))
//!     .build(())?;
//!
//! machine.initialize()?;
//! machine.send(FLIP)?;
//! machine.handle_event()?;
//! assert_eq!(machine.current_state(), ON);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod capability;
pub mod config;
pub mod core;
pub mod engine;
pub mod orchestrator;
pub mod subsystems;

// Re-export the types nearly every user touches.
pub use crate::builder::{BuildError, MachineBuilder, StateBuilder};
pub use crate::core::{Event, EventQueue, StateId};
pub use crate::engine::{FsmError, Machine, MachineCell, Outcome, Subsystem};
pub use crate::orchestrator::Orchestrator;
