//! Construction-input errors.

use crate::core::{Event, StateId};
use thiserror::Error;

/// Rejected construction input. Machines are built once at process start, so
/// these indicate a broken table, not a runtime condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("machine '{0}' has no states; index 0 must be the initial state")]
    NoStates(&'static str),

    #[error("machine '{machine}': state '{state}' targets out-of-range state {destination}")]
    InvalidDestination {
        machine: &'static str,
        state: &'static str,
        destination: StateId,
    },

    #[error("machine '{machine}': state '{state}' declares {event} twice")]
    DuplicateTrigger {
        machine: &'static str,
        state: &'static str,
        event: Event,
    },
}
