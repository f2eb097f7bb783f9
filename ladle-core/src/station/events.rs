//! Loop output events
//!
//! The core does not log; the firmware turns these into log lines.

use ladle_protocol::Order;

use crate::config::{MAX_AXES, MAX_MODULES};
use crate::dispense::Stroke;
use crate::recovery::ReplayOutcome;
use crate::state::ErrorKind;

/// Maximum events reported by one call
///
/// One per axis or module, plus the order, pass and outcome events.
pub const MAX_EVENTS: usize = MAX_AXES + MAX_MODULES + 4;

/// Something the station loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StationEvent {
    /// Recovery record for an axis was handled at boot
    Replayed { axis: u8, outcome: ReplayOutcome },
    /// Pump line purged at boot
    BootPurge,
    /// Boot finished; waiting for orders
    Booted,
    /// New order adopted
    OrderAccepted { generation: u32, order: Order },
    /// Published message carried the "no order" quantity
    OrderIgnored { generation: u32 },
    /// Pass started with `active` modules
    PassStarted { pass: u32, active: u8 },
    /// A module's choreography finished for this pass
    ChoreographyComplete { module: u8 },
    /// Pump stroke started
    StrokeStarted(Stroke),
    /// Pump stroke finished
    StrokeComplete(Stroke),
    /// Item code has no duty; the pump stays off
    UnknownItem(i16),
    /// Every active module finished
    PassComplete { pass: u32 },
    /// Clean-in-place started
    CleaningStarted,
    /// Clean-in-place finished
    CleaningComplete,
    /// All windows exhausted
    OrderComplete,
    /// Outputs stopped
    Fault(ErrorKind),
}
