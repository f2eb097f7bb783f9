//! Phase machine definition
//!
//! All actuator behavior is a function of the current phase and an event.

use super::events::Event;

/// Node phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Power-on: recovery replay and boot purge
    Boot,
    /// No order received since boot
    Waiting,
    /// Module choreographies for the current pass are running
    Running,
    /// Pass done, waiting for the conveyor to advance
    Settling,
    /// Clean-in-place run after the last unit
    Cleaning,
    /// Order finished; waiting for the next one
    Complete,
    /// Fault detected; outputs stopped until restart
    Fault(ErrorKind),
}

/// Types of faults that can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Axis leg exceeded its stall timeout or the driver reported a stall
    MotorStall,
    /// Stepper driver I/O failure
    StepperFault,
    /// Recovery store read/write failure
    StoreFault,
    /// Pump driver failure
    PumpFault,
    /// Choreography references hardware the node does not have
    ConfigFault,
}

impl Phase {
    /// Check if this phase allows axis motion
    pub fn motion_allowed(&self) -> bool {
        matches!(self, Phase::Running)
    }

    /// Check if this phase accepts a new order
    pub fn accepts_order(&self) -> bool {
        matches!(self, Phase::Waiting | Phase::Settling | Phase::Complete)
    }

    /// Check if this is a fault phase
    pub fn is_fault(&self) -> bool {
        matches!(self, Phase::Fault(_))
    }

    /// Process an event and return the next phase
    ///
    /// Faults are sticky: no event leaves [`Phase::Fault`].
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Phase::*;

        match (self, event) {
            (Fault(_), _) => self,
            (_, ErrorDetected(kind)) => Fault(kind),

            (Boot, BootComplete) => Waiting,

            (Waiting, OrderAccepted) => Running,
            (Complete, OrderAccepted) => Running,
            // Last-write-wins: a new order replaces the one in flight at the
            // next pass boundary
            (Settling, OrderAccepted) => Running,

            (Running, PassFinished) => Settling,
            (Running, OrderFinished) => Complete,
            (Running, CleaningRequested) => Cleaning,

            (Settling, SettleElapsed) => Running,

            (Cleaning, CleaningFinished) => Complete,

            // Default: stay in current phase
            _ => self,
        }
    }
}
