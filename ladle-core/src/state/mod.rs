//! Node phase state machine
//!
//! The control loop's coarse phase is an explicit, finite, deterministic
//! function of the previous phase and an event.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{ErrorKind, Phase};
