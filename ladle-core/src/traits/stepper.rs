//! Stepper motor driver trait
//!
//! This trait abstracts over step/dir driver boards (A4988, DRV8825,
//! TMC2209 in standalone mode). Pulse timing lives in the implementation;
//! the motion profile decides when a step is due.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Increasing position (+1)
    Forward,
    /// Decreasing position (-1)
    Backward,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Signed unit value (+1 / -1)
    pub fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    /// Direction of travel from `from` to `to`, `None` when already there
    pub fn toward(from: i32, to: i32) -> Option<Self> {
        match to.cmp(&from) {
            core::cmp::Ordering::Greater => Some(Direction::Forward),
            core::cmp::Ordering::Less => Some(Direction::Backward),
            core::cmp::Ordering::Equal => None,
        }
    }

    /// Parse a signed unit value; 0 means "not moving"
    pub fn from_sign(sign: i8) -> Option<Self> {
        match sign {
            1 => Some(Direction::Forward),
            -1 => Some(Direction::Backward),
            _ => None,
        }
    }
}

/// Errors that can occur with stepper operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperError {
    /// Pin or bus error talking to the driver
    Io,
    /// Motor stall reported by the driver
    StallDetected,
}

/// Trait for stepper motor drivers
///
/// Implementations emit one step pulse per call to [`StepperDriver::step`].
pub trait StepperDriver {
    /// Emit a single step in the given direction
    fn step(&mut self, dir: Direction) -> Result<(), StepperError>;

    /// Enable or disable the motor driver
    ///
    /// When disabled, the motor is free to rotate and does not hold position.
    fn enable(&mut self, enabled: bool) -> Result<(), StepperError>;

    /// Check if the motor is enabled
    fn is_enabled(&self) -> bool;

    /// Check if a stall has been detected
    ///
    /// Drivers without stall detection always report false.
    fn is_stalled(&self) -> bool {
        false
    }
}
