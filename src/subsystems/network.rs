//! Network link machine: Unknown -> Active / Inactive.
//!
//! Level-triggered reconnect policy: Active verifies the link on the 1 s
//! tick and self-sends Stop when it dropped; Inactive re-attempts the
//! connection on the 5 s tick with no backoff. Stop and Start stay
//! externally triggerable.

use crate::builder::{BuildError, MachineBuilder, StateBuilder};
use crate::capability::Link;
use crate::core::{Event, EventQueue};
use crate::engine::MachineCell;
use crate::subsystems::{ACTIVE, EVENT_START, EVENT_STOP, INACTIVE};
use log::warn;

/// Context owned by the network machine.
pub struct NetworkCtx<L: Link> {
    pub link: L,
}

/// Build the network machine around its link capability.
pub fn machine<L: Link + 'static>(link: L) -> Result<MachineCell<NetworkCtx<L>>, BuildError> {
    let machine = MachineBuilder::new("network")
        .state(
            StateBuilder::new("unknown")
                .on_entry(|ctx: &mut NetworkCtx<L>, queue: &mut EventQueue| {
                    // Resolved in the same drain pass as soon as queued.
                    match ctx.link.connect() {
                        Ok(()) => queue.send(EVENT_START)?,
                        Err(err) => {
                            warn!("network: connect failed: {err}");
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
                .transition_with(
                    Event::TICK_1S,
                    ACTIVE,
                    |ctx: &mut NetworkCtx<L>, queue: &mut EventQueue| {
                        if !ctx.link.is_connected() {
                            warn!("network: link dropped");
                            queue.send(EVENT_STOP)?;
                        }
                        Ok(())
                    },
                ),
        )
        .state(
            StateBuilder::new("inactive")
                .transition(EVENT_START, ACTIVE)
                .transition_with(
                    Event::TICK_5S,
                    INACTIVE,
                    |ctx: &mut NetworkCtx<L>, queue: &mut EventQueue| {
                        if ctx.link.connect().is_ok() {
                            queue.send(EVENT_START)?;
                        }
                        Ok(())
                    },
                ),
        )
        .build(NetworkCtx { link })?;
    Ok(MachineCell::new(machine))
}
