//! Pump motor driver trait
//!
//! The sauce pump is a brushed DC motor on an H-bridge: two direction
//! inputs and a PWM enable. Duty is expressed on the 0-255 scale the pump
//! calibration was measured in.

/// Pump flow direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpDirection {
    /// Pump sauce out to the container
    Dispense,
    /// Pump sauce back into the bucket
    Reverse,
}

/// Errors that can occur with motor operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpError {
    /// Pin or PWM peripheral error
    Io,
    /// Invalid duty value
    InvalidSpeed,
}

/// Trait for the pump motor
pub trait PumpDriver {
    /// Drive the pump in `dir` at `duty` (0-255)
    fn run(&mut self, dir: PumpDirection, duty: u8) -> Result<(), PumpError>;

    /// Stop the pump (both bridge inputs low, duty 0)
    fn stop(&mut self) -> Result<(), PumpError>;

    /// Check if the pump is currently running
    fn is_running(&self) -> bool;
}

/// Placeholder for nodes without a pump
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPump;

impl PumpDriver for NoPump {
    fn run(&mut self, _dir: PumpDirection, _duty: u8) -> Result<(), PumpError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PumpError> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        false
    }
}
