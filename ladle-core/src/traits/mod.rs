//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod pump;
pub mod stepper;

pub use pump::{PumpError, NoPump, PumpDirection, PumpDriver};
pub use stepper::{Direction, StepperDriver, StepperError};
