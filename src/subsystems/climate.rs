//! Temperature/humidity machine: Unknown -> Active / Inactive.
//!
//! Active reads the probe on the 5 s tick and caches the readings for
//! external query; Inactive performs no polling. A failed or NaN read caches
//! [`READING_INVALID`] instead of failing the transition, so a flaky sensor
//! degrades the published values rather than the machine.

use crate::builder::{BuildError, MachineBuilder, StateBuilder};
use crate::capability::ClimateProbe;
use crate::core::{ActionResult, Event, EventQueue};
use crate::engine::MachineCell;
use crate::subsystems::{ACTIVE, EVENT_START, EVENT_STOP, INACTIVE};
use log::warn;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Sentinel cached when a read is invalid.
pub const READING_INVALID: i32 = 1000;

/// Latest cached readings, shared with the bus machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ClimateReadings {
    pub temperature: i32,
    pub humidity: i32,
}

impl Default for ClimateReadings {
    fn default() -> Self {
        Self {
            temperature: READING_INVALID,
            humidity: READING_INVALID,
        }
    }
}

/// Context owned by the climate machine.
pub struct ClimateCtx<P: ClimateProbe> {
    pub probe: P,
    /// Calibration offset subtracted from valid temperature readings.
    pub temperature_offset: i32,
    pub readings: Rc<RefCell<ClimateReadings>>,
}

fn sample<P: ClimateProbe>(ctx: &mut ClimateCtx<P>, _queue: &mut EventQueue) -> ActionResult {
    let sample = ctx.probe.read();
    let mut readings = ctx.readings.borrow_mut();

    match sample.temperature {
        Some(value) if value.is_finite() => {
            readings.temperature = value as i32 - ctx.temperature_offset;
        }
        _ => {
            warn!("climate: invalid temperature read");
            readings.temperature = READING_INVALID;
        }
    }
    match sample.humidity {
        Some(value) if value.is_finite() => {
            readings.humidity = value as i32;
        }
        _ => {
            warn!("climate: invalid humidity read");
            readings.humidity = READING_INVALID;
        }
    }
    Ok(())
}

/// Build the climate machine around its context.
pub fn machine<P: ClimateProbe + 'static>(
    ctx: ClimateCtx<P>,
) -> Result<MachineCell<ClimateCtx<P>>, BuildError> {
    let machine = MachineBuilder::new("climate")
        .state(
            StateBuilder::new("unknown")
                .on_entry(|ctx: &mut ClimateCtx<P>, queue: &mut EventQueue| {
                    match ctx.probe.begin() {
                        Ok(()) => queue.send(EVENT_START)?,
                        Err(err) => {
                            warn!("climate: probe setup failed: {err}");
                            queue.send(EVENT_STOP)?;
                        }
                    }
                    Ok(())
                })
                .transition(EVENT_START, ACTIVE)
                .transition(EVENT_STOP, INACTIVE),
        )
        .state(
            StateBuilder::new("active")
                .transition(EVENT_STOP, INACTIVE)
                .transition_with(Event::TICK_5S, ACTIVE, sample::<P>),
        )
        .state(StateBuilder::new("inactive").transition(EVENT_START, ACTIVE))
        .build(ctx)?;
    Ok(MachineCell::new(machine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityError, ClimateSample};
    use crate::subsystems::UNKNOWN;

    struct FakeProbe {
        begin_ok: bool,
        next: ClimateSample,
    }

    impl ClimateProbe for FakeProbe {
        fn begin(&mut self) -> Result<(), CapabilityError> {
            if self.begin_ok {
                Ok(())
            } else {
                Err(CapabilityError::new("no probe"))
            }
        }

        fn read(&mut self) -> ClimateSample {
            self.next
        }
    }

    fn setup(probe: FakeProbe, offset: i32) -> (Rc<RefCell<ClimateReadings>>, MachineCell<ClimateCtx<FakeProbe>>) {
        let readings = Rc::new(RefCell::new(ClimateReadings::default()));
        let cell = machine(ClimateCtx {
            probe,
            temperature_offset: offset,
            readings: Rc::clone(&readings),
        })
        .unwrap();
        (readings, cell)
    }

    #[test]
    fn probe_setup_drives_startup_into_active() {
        let (_readings, cell) = setup(
            FakeProbe {
                begin_ok: true,
                next: ClimateSample::default(),
            },
            0,
        );

        cell.with_mut(|m| {
            m.initialize().unwrap();
            assert_eq!(m.current_state(), UNKNOWN);
            m.drain().unwrap();
            assert_eq!(m.current_state(), ACTIVE);
        });
    }

    #[test]
    fn failed_probe_setup_lands_in_inactive() {
        let (_readings, cell) = setup(
            FakeProbe {
                begin_ok: false,
                next: ClimateSample::default(),
            },
            0,
        );

        cell.with_mut(|m| {
            m.initialize().unwrap();
            m.drain().unwrap();
            assert_eq!(m.current_state(), INACTIVE);
        });
    }

    #[test]
    fn valid_reads_are_cached_with_the_offset_applied() {
        let (readings, cell) = setup(
            FakeProbe {
                begin_ok: true,
                next: ClimateSample {
                    temperature: Some(24.7),
                    humidity: Some(51.0),
                },
            },
            3,
        );

        cell.with_mut(|m| {
            m.initialize().unwrap();
            m.drain().unwrap();
            m.send(Event::TICK_5S).unwrap();
            m.drain().unwrap();
        });

        assert_eq!(readings.borrow().temperature, 21);
        assert_eq!(readings.borrow().humidity, 51);
    }

    #[test]
    fn invalid_reads_cache_the_sentinel_without_failing() {
        let (readings, cell) = setup(
            FakeProbe {
                begin_ok: true,
                next: ClimateSample {
                    temperature: Some(f32::NAN),
                    humidity: None,
                },
            },
            0,
        );

        cell.with_mut(|m| {
            m.initialize().unwrap();
            m.drain().unwrap();
            m.send(Event::TICK_5S).unwrap();
            m.drain().unwrap();
            assert_eq!(m.current_state(), ACTIVE);
        });

        assert_eq!(readings.borrow().temperature, READING_INVALID);
        assert_eq!(readings.borrow().humidity, READING_INVALID);
    }

    #[test]
    fn inactive_does_not_poll() {
        let (readings, cell) = setup(
            FakeProbe {
                begin_ok: true,
                next: ClimateSample {
                    temperature: Some(30.0),
                    humidity: Some(40.0),
                },
            },
            0,
        );

        cell.with_mut(|m| {
            m.initialize().unwrap();
            m.drain().unwrap();
            m.send(EVENT_STOP).unwrap();
            m.drain().unwrap();
            m.send(Event::TICK_5S).unwrap();
            m.drain().unwrap();
        });

        assert_eq!(*readings.borrow(), ClimateReadings::default());
    }
}
