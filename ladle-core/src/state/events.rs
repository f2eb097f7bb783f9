//! Events that trigger phase transitions

use super::machine::ErrorKind;

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Lifecycle events
    /// Recovery replay and boot purge finished
    BootComplete,

    // Order events
    /// A new order generation was adopted
    OrderAccepted,
    /// Every module window of the order is exhausted
    OrderFinished,
    /// Windows exhausted and a cleaning flag is set
    CleaningRequested,
    /// Clean-in-place run finished
    CleaningFinished,

    // Pass events
    /// Every active module finished its work for this pass
    PassFinished,
    /// Settle delay and pass period both elapsed
    SettleElapsed,

    // Safety events
    /// Fault detected by the motion or dispense layer
    ErrorDetected(ErrorKind),
}

impl Event {
    /// Check if this event originates from the bus
    pub fn is_order_event(&self) -> bool {
        matches!(self, Event::OrderAccepted)
    }

    /// Check if this is an error event
    pub fn is_error(&self) -> bool {
        matches!(self, Event::ErrorDetected(_))
    }
}
