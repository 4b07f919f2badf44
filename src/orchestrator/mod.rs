//! Cooperative tick loop.
//!
//! At a fixed 500 ms cadence the orchestrator fans the due periodic ticks out
//! to every registered machine, then drains each machine's queue completely,
//! in registration order. The sleep between iterations is the only
//! intentional suspension point in the whole runtime and is not cancellable.

use crate::core::Event;
use crate::engine::{FsmError, Subsystem};
use log::{debug, warn};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

/// Base tick period.
pub const TICK_PERIOD_MS: u64 = 500;
/// The elapsed counter wraps at the slowest tick interval.
pub const SCHEDULE_WRAP_MS: u64 = 5_000;

/// Ticks due after the elapsed counter advanced to `elapsed_ms`.
///
/// A single iteration may fire more than one tick kind; the 500 ms tick
/// always fires, the others on their own multiples.
fn due_ticks(elapsed_ms: u64) -> Vec<Event> {
    let mut due = Vec::with_capacity(3);
    if elapsed_ms % 500 == 0 {
        due.push(Event::TICK_500MS);
    }
    if elapsed_ms % 1_000 == 0 {
        due.push(Event::TICK_1S);
    }
    if elapsed_ms % 5_000 == 0 {
        due.push(Event::TICK_5S);
    }
    due
}

/// Registry of machines plus the periodic schedule that drives them.
///
/// # Example
///
/// ```rust
/// use devloop::builder::{MachineBuilder, StateBuilder};
/// use devloop::engine::MachineCell;
/// use devloop::orchestrator::Orchestrator;
///
/// let machine = MachineBuilder::new("noop")
///     .state(StateBuilder::new("only"))
///     .build(())
///     .unwrap();
/// let cell = MachineCell::new(machine);
///
/// let mut orchestrator = Orchestrator::new();
/// orchestrator.register(cell.handle());
/// orchestrator.initialize_all().unwrap();
/// orchestrator.step();
/// ```
pub struct Orchestrator {
    subsystems: Vec<Rc<dyn Subsystem>>,
    elapsed_ms: u64,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            subsystems: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Register a machine. Tick fan-out and drains follow registration
    /// order.
    pub fn register(&mut self, subsystem: Rc<dyn Subsystem>) {
        debug!("registered subsystem '{}'", subsystem.name());
        self.subsystems.push(subsystem);
    }

    /// One-time process entry point: initialize every machine in order, then
    /// drain each so entry-action self-sends resolve before the first tick.
    pub fn initialize_all(&mut self) -> Result<(), FsmError> {
        for subsystem in &self.subsystems {
            subsystem.initialize()?;
        }
        self.drain_all();
        Ok(())
    }

    /// One iteration: advance the schedule, send every due tick to every
    /// machine, then drain every machine.
    pub fn step(&mut self) {
        self.elapsed_ms += TICK_PERIOD_MS;
        let due = due_ticks(self.elapsed_ms);
        self.elapsed_ms %= SCHEDULE_WRAP_MS;

        for tick in &due {
            for subsystem in &self.subsystems {
                if let Err(err) = subsystem.send(*tick) {
                    warn!("{}: dropped {}: {}", subsystem.name(), tick, err);
                }
            }
        }
        self.drain_all();
    }

    /// Block forever, stepping once per tick period. The loop does no other
    /// work during the sleep.
    pub fn run(&mut self) -> ! {
        loop {
            thread::sleep(Duration::from_millis(TICK_PERIOD_MS));
            self.step();
        }
    }

    fn drain_all(&self) {
        for subsystem in &self.subsystems {
            if let Err(err) = subsystem.drain() {
                // Not retried until the next natural event arrives.
                warn!("{}: drain stopped: {}", subsystem.name(), err);
            }
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
