//! Proximity machine: Unknown -> Active / Inactive.
//!
//! Active keeps the pulse interrupt enabled and runs the hysteresis
//! evaluation on the 5 s tick; the filtered presence output is an
//! edge-triggered latch, flipped only when the motion counter crosses zero
//! in either direction so downstream publishers are not flooded.

use crate::builder::{BuildError, MachineBuilder, StateBuilder};
use crate::capability::PulseSource;
use crate::core::{ActionResult, Event, EventQueue};
use crate::engine::MachineCell;
use crate::subsystems::motion::MotionGate;
use crate::subsystems::{ACTIVE, EVENT_START, EVENT_STOP, INACTIVE};
use log::info;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// Context owned by the proximity machine.
pub struct ProximityCtx<P: PulseSource> {
    pulses: P,
    gate: Arc<MotionGate>,
    presence: Rc<Cell<bool>>,
    was_detected: bool,
}

impl<P: PulseSource> ProximityCtx<P> {
    /// `presence` is the shared latch other subsystems read.
    pub fn new(pulses: P, gate: Arc<MotionGate>, presence: Rc<Cell<bool>>) -> Self {
        Self {
            pulses,
            gate,
            presence,
            was_detected: false,
        }
    }

    pub fn gate(&self) -> &Arc<MotionGate> {
        &self.gate
    }
}

fn evaluate<P: PulseSource>(ctx: &mut ProximityCtx<P>, _queue: &mut EventQueue) -> ActionResult {
    let detected = ctx.gate.evaluate();
    if detected != ctx.was_detected {
        // Latch flips only on counter zero-crossings.
        ctx.presence.set(detected);
        info!(
            "proximity: presence {}",
            if detected { "detected" } else { "cleared" }
        );
        ctx.was_detected = detected;
    }
    Ok(())
}

/// Build the proximity machine around its context.
pub fn machine<P: PulseSource + 'static>(
    ctx: ProximityCtx<P>,
) -> Result<MachineCell<ProximityCtx<P>>, BuildError> {
    let machine = MachineBuilder::new("proximity")
        .state(
            StateBuilder::new("unknown")
                .on_entry(|_ctx: &mut ProximityCtx<P>, queue: &mut EventQueue| {
                    queue.send(EVENT_START)?;
                    Ok(())
                })
                .transition(EVENT_START, ACTIVE)
                .transition(EVENT_STOP, INACTIVE),
        )
        .state(
            StateBuilder::new("active")
                .on_entry(|ctx: &mut ProximityCtx<P>, _queue: &mut EventQueue| {
                    ctx.pulses.enable();
                    Ok(())
                })
                .transition(EVENT_STOP, INACTIVE)
                .transition_with(Event::TICK_5S, ACTIVE, evaluate::<P>),
        )
        .state(
            StateBuilder::new("inactive")
                .on_entry(|ctx: &mut ProximityCtx<P>, _queue: &mut EventQueue| {
                    ctx.pulses.disable();
                    Ok(())
                })
                .transition(EVENT_START, ACTIVE),
        )
        .build(ctx)?;
    Ok(MachineCell::new(machine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Clock;
    use crate::subsystems::UNKNOWN;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ManualClock(AtomicU64);

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct FakeIrq {
        enabled: bool,
        toggles: usize,
    }

    impl PulseSource for FakeIrq {
        fn enable(&mut self) {
            self.enabled = true;
            self.toggles += 1;
        }
        fn disable(&mut self) {
            self.enabled = false;
            self.toggles += 1;
        }
    }

    fn setup() -> (
        Arc<ManualClock>,
        Arc<MotionGate>,
        Rc<Cell<bool>>,
        MachineCell<ProximityCtx<FakeIrq>>,
    ) {
        let clock = Arc::new(ManualClock(AtomicU64::new(0)));
        let gate = Arc::new(MotionGate::new(clock.clone()));
        let presence = Rc::new(Cell::new(false));
        let ctx = ProximityCtx::new(FakeIrq::default(), Arc::clone(&gate), Rc::clone(&presence));
        let cell = machine(ctx).unwrap();
        (clock, gate, presence, cell)
    }

    fn tick_5s(cell: &MachineCell<ProximityCtx<FakeIrq>>) {
        cell.with_mut(|m| {
            m.send(Event::TICK_5S).unwrap();
            m.drain().unwrap();
        });
    }

    #[test]
    fn startup_self_sends_into_active_and_enables_the_irq() {
        let (_clock, _gate, _presence, cell) = setup();

        cell.with_mut(|m| {
            m.initialize().unwrap();
            assert_eq!(m.current_state(), UNKNOWN);
            m.drain().unwrap();
            assert_eq!(m.current_state(), ACTIVE);
            assert!(m.context().pulses.enabled);
        });
    }

    #[test]
    fn stop_disables_the_irq() {
        let (_clock, _gate, _presence, cell) = setup();
        cell.with_mut(|m| {
            m.initialize().unwrap();
            m.drain().unwrap();
            m.send(EVENT_STOP).unwrap();
            m.drain().unwrap();
            assert_eq!(m.current_state(), INACTIVE);
            assert!(!m.context().pulses.enabled);
        });
    }

    #[test]
    fn presence_latches_on_zero_crossings_only() {
        let (clock, gate, presence, cell) = setup();
        cell.with_mut(|m| {
            m.initialize().unwrap();
            m.drain().unwrap();
        });

        // Three pulses within a second.
        clock.0.store(1_000, Ordering::SeqCst);
        gate.pulse();
        gate.pulse();
        gate.pulse();

        clock.0.store(5_000, Ordering::SeqCst);
        tick_5s(&cell);
        assert!(presence.get());
        assert_eq!(gate.count(), 3);

        // Decay steps keep the latch high until the counter hits zero.
        clock.0.store(122_000, Ordering::SeqCst);
        tick_5s(&cell);
        assert_eq!(gate.count(), 2);
        assert!(presence.get());

        clock.0.store(243_000, Ordering::SeqCst);
        tick_5s(&cell);
        assert_eq!(gate.count(), 1);
        assert!(presence.get());

        clock.0.store(364_000, Ordering::SeqCst);
        tick_5s(&cell);
        assert_eq!(gate.count(), 0);
        assert!(!presence.get());
    }
}
