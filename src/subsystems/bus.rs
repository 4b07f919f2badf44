//! Message-bus machine: Unknown -> Active / Inactive.
//!
//! Same connectivity shape as the network machine with the cadences
//! swapped: Active verifies the broker connection on the 5 s tick, Inactive
//! retries it on the 1 s tick. The Active 5 s pass also publishes the cached
//! climate readings and the presence latch; the proximity machine is paused
//! around the publishes so the motion interrupt stays quiet while the bus is
//! busy.

use crate::builder::{BuildError, MachineBuilder, StateBuilder};
use crate::capability::BrokerClient;
use crate::config::TopicConfig;
use crate::core::{ActionResult, Event, EventQueue};
use crate::engine::{MachineCell, Subsystem};
use crate::subsystems::climate::ClimateReadings;
use crate::subsystems::{ACTIVE, EVENT_START, EVENT_STOP, INACTIVE};
use log::warn;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Context owned by the bus machine.
pub struct BusCtx<B: BrokerClient> {
    pub client: B,
    pub topics: TopicConfig,
    /// Cached climate readings, written by the climate machine.
    pub readings: Rc<RefCell<ClimateReadings>>,
    /// Presence latch, written by the proximity machine.
    pub presence: Rc<Cell<bool>>,
    /// Paused around each publish pass when present.
    pub proximity: Option<Rc<dyn Subsystem>>,
}

fn connect_and_report<B: BrokerClient>(
    ctx: &mut BusCtx<B>,
    queue: &mut EventQueue,
    on_failure: Option<Event>,
) -> ActionResult {
    match ctx.client.connect() {
        Ok(()) => queue.send(EVENT_START)?,
        Err(err) => {
            warn!("bus: broker connect failed: {err}");
            if let Some(event) = on_failure {
                queue.send(event)?;
            }
        }
    }
    Ok(())
}

fn publish_pass<B: BrokerClient>(ctx: &mut BusCtx<B>, queue: &mut EventQueue) -> ActionResult {
    if !ctx.client.is_connected() {
        queue.send(EVENT_STOP)?;
        return Ok(());
    }

    // Quiet the motion interrupt while pushing readings out.
    if let Some(proximity) = &ctx.proximity {
        if let Err(err) = proximity.send(EVENT_STOP).and_then(|_| proximity.drain()) {
            warn!("bus: pausing proximity failed: {err}");
        }
    }

    let readings = *ctx.readings.borrow();
    let presence = if ctx.presence.get() { "person" } else { "empty" };
    let pairs = [
        (ctx.topics.temperature.as_str(), readings.temperature.to_string()),
        (ctx.topics.humidity.as_str(), readings.humidity.to_string()),
        (ctx.topics.presence.as_str(), presence.to_string()),
    ];
    for (topic, payload) in &pairs {
        if let Err(err) = ctx.client.publish(topic, payload) {
            warn!("bus: publish to '{topic}' failed: {err}");
        }
    }

    if let Some(proximity) = &ctx.proximity {
        if let Err(err) = proximity.send(EVENT_START).and_then(|_| proximity.drain()) {
            warn!("bus: resuming proximity failed: {err}");
        }
    }
    Ok(())
}

/// Build the bus machine around its context.
pub fn machine<B: BrokerClient + 'static>(
    ctx: BusCtx<B>,
) -> Result<MachineCell<BusCtx<B>>, BuildError> {
    let machine = MachineBuilder::new("bus")
        .state(
            StateBuilder::new("unknown")
                .on_entry(|ctx: &mut BusCtx<B>, queue: &mut EventQueue| {
                    connect_and_report(ctx, queue, Some(EVENT_STOP))
                })
                .transition(EVENT_START, ACTIVE)
                .transition(EVENT_STOP, INACTIVE),
        )
        .state(
            StateBuilder::new("active")
                .transition(EVENT_STOP, INACTIVE)
                .transition_with(Event::TICK_5S, ACTIVE, publish_pass::<B>),
        )
        .state(
            StateBuilder::new("inactive")
                .transition(EVENT_START, ACTIVE)
                .transition_with(
                    Event::TICK_1S,
                    INACTIVE,
                    |ctx: &mut BusCtx<B>, queue: &mut EventQueue| {
                        connect_and_report(ctx, queue, None)
                    },
                ),
        )
        .build(ctx)?;
    Ok(MachineCell::new(machine))
}
