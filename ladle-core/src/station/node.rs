//! Per-node runtime state

use ladle_protocol::Order;

use crate::state::Phase;

/// Everything the loop knows about its progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeState {
    /// Current phase
    pub phase: Phase,
    /// Completed passes since boot; never reset while running
    pub iteration: u32,
    /// Order in force
    pub order: Order,
    /// Generation of the last order seen on the cell
    pub generation: u32,
    /// Iteration at which the current order was adopted
    pub order_start: u32,
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeState {
    /// Fresh state at power-up
    pub const fn new() -> Self {
        Self {
            phase: Phase::Boot,
            iteration: 0,
            order: Order::none(),
            generation: 0,
            order_start: 0,
        }
    }

    /// Pass number within the current order
    pub fn pass(&self) -> u32 {
        self.iteration.wrapping_sub(self.order_start)
    }
}
