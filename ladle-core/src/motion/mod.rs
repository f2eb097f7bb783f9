//! Motion planning and choreography
//!
//! [`AxisDriver`] turns a target position into step pulses with a
//! trapezoidal speed profile. [`Sequencer`] runs a module's
//! [`Choreography`] across several axes and logs recovery records.

pub mod axis;
pub mod sequencer;

pub use axis::{Axis, AxisDriver, Leg, MotionState};
pub use sequencer::{ChoreoStep, Choreography, MotionError, Sequencer, SequencerState};
