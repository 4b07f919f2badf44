//! Capability contracts for the external collaborators.
//!
//! The runtime invokes hardware and network facilities only through these
//! traits; sensor reads, the network stack and the message-bus wire protocol
//! live behind them. The core never retries a capability call within one
//! action, it relies on the next tick to retry.

use crate::core::ActionError;
use std::time::Instant;
use thiserror::Error;

/// Failure reported by an external capability call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CapabilityError(String);

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        CapabilityError(message.into())
    }
}

impl From<CapabilityError> for ActionError {
    fn from(err: CapabilityError) -> Self {
        ActionError::new(err.to_string())
    }
}

/// Network join capability.
pub trait Link {
    /// Attempt to establish the link, blocking at most for the capability's
    /// own timeout.
    fn connect(&mut self) -> Result<(), CapabilityError>;

    /// Whether the link is currently live.
    fn is_connected(&self) -> bool;
}

/// Message-bus capability: connect/connected-check plus the publish sink.
pub trait BrokerClient {
    fn connect(&mut self) -> Result<(), CapabilityError>;

    fn is_connected(&self) -> bool;

    /// Push one named topic/value pair outward. Not buffered or batched
    /// beyond this synchronous call.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CapabilityError>;
}

/// One temperature/humidity sample. `None` models an invalid (NaN) read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClimateSample {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

/// Temperature/humidity probe.
pub trait ClimateProbe {
    /// One-time hardware setup.
    fn begin(&mut self) -> Result<(), CapabilityError>;

    fn read(&mut self) -> ClimateSample;
}

/// Interrupt-style raw motion pulse source. Enabled while the proximity
/// machine is active; the pulses themselves arrive asynchronously through
/// [`crate::subsystems::motion::MotionGate::pulse`].
pub trait PulseSource {
    fn enable(&mut self);
    fn disable(&mut self);
}

/// Monotonic millisecond clock.
///
/// `Send + Sync` because the motion gate shares its clock with the interrupt
/// producer.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
