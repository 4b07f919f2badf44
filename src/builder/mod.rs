//! Builder API for declaring machines as data.
//!
//! Transition tables are described once, validated, and never re-derived at
//! runtime. Validation failures are [`BuildError`]s; a machine that builds
//! successfully upholds the table invariants for its whole lifetime.

pub mod error;
pub mod machine;
pub mod state;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
