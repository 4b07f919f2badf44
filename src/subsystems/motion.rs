//! Hysteresis filter between the motion interrupt and the cooperative loop.
//!
//! An interrupt-style producer calls [`MotionGate::pulse`] on every raw
//! detection, independent of the tick cadence. The proximity machine calls
//! [`MotionGate::evaluate`] on its 5 s tick. The counter and its timestamp
//! cross the interrupt boundary together, so both live under one mutex and
//! every access is a single short critical section.

use crate::capability::Clock;
use std::sync::{Arc, Mutex, PoisonError};

/// Repeated pulses saturate the counter here.
pub const MOTION_COUNT_MAX: u8 = 3;
/// A pulse-free counter decays by one step after this window.
pub const MOTION_DECAY_WINDOW_MS: u64 = 120_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MotionSample {
    count: u8,
    last_pulse_ms: u64,
}

/// Bounded motion counter with timed decay.
///
/// The only object in the runtime shared across a concurrency boundary:
/// `Arc<MotionGate>` is handed both to the interrupt producer and to the
/// proximity machine's context.
pub struct MotionGate {
    sample: Mutex<MotionSample>,
    clock: Arc<dyn Clock>,
}

impl MotionGate {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sample: Mutex::new(MotionSample::default()),
            clock,
        }
    }

    /// Interrupt side: record one raw detection pulse.
    pub fn pulse(&self) {
        let now = self.clock.now_ms();
        let mut sample = self.sample.lock().unwrap_or_else(PoisonError::into_inner);
        if sample.count < MOTION_COUNT_MAX {
            sample.count += 1;
        }
        sample.last_pulse_ms = now;
    }

    /// Evaluation side: apply decay, then report whether motion is raw
    /// detected (counter above zero).
    ///
    /// The counter decays by at most one step per call, once more than
    /// [`MOTION_DECAY_WINDOW_MS`] elapsed since the recorded timestamp; the
    /// timestamp is refreshed on decay so each step takes a full window.
    pub fn evaluate(&self) -> bool {
        let now = self.clock.now_ms();
        let mut sample = self.sample.lock().unwrap_or_else(PoisonError::into_inner);
        if sample.count > 0 && now.saturating_sub(sample.last_pulse_ms) > MOTION_DECAY_WINDOW_MS {
            sample.count -= 1;
            sample.last_pulse_ms = now;
        }
        sample.count > 0
    }

    /// Current counter value (diagnostics).
    pub fn count(&self) -> u8 {
        self.sample
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn set(&self, ms: u64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn gate() -> (Arc<ManualClock>, MotionGate) {
        let clock = Arc::new(ManualClock(AtomicU64::new(0)));
        let gate = MotionGate::new(clock.clone());
        (clock, gate)
    }

    #[test]
    fn pulses_saturate_at_the_cap() {
        let (_clock, gate) = gate();
        for _ in 0..10 {
            gate.pulse();
        }
        assert_eq!(gate.count(), MOTION_COUNT_MAX);
    }

    #[test]
    fn counter_decays_one_step_per_window() {
        let (clock, gate) = gate();
        clock.set(1_000);
        gate.pulse();
        gate.pulse();

        // Inside the window: no decay.
        clock.set(100_000);
        assert!(gate.evaluate());
        assert_eq!(gate.count(), 2);

        // Past the window: one step, timestamp refreshed.
        clock.set(122_000);
        assert!(gate.evaluate());
        assert_eq!(gate.count(), 1);

        // The next step needs a full window from the refresh.
        clock.set(150_000);
        assert!(gate.evaluate());
        assert_eq!(gate.count(), 1);

        clock.set(243_000);
        assert!(!gate.evaluate());
        assert_eq!(gate.count(), 0);
    }

    #[test]
    fn fresh_pulse_resets_the_window() {
        let (clock, gate) = gate();
        clock.set(0);
        gate.pulse();

        clock.set(110_000);
        gate.pulse();

        // 120 s from the first pulse but only 15 s from the second.
        clock.set(125_000);
        assert!(gate.evaluate());
        assert_eq!(gate.count(), 2);
    }

    #[test]
    fn pulses_race_free_from_another_thread() {
        let (_clock, gate) = gate();
        let gate = Arc::new(gate);
        let producer = Arc::clone(&gate);

        let handle = std::thread::spawn(move || {
            for _ in 0..100 {
                producer.pulse();
            }
        });
        for _ in 0..100 {
            gate.evaluate();
        }
        handle.join().unwrap();

        assert!(gate.count() <= MOTION_COUNT_MAX);
    }
}
