//! Critical-section protected order slot

use core::cell::Cell;

use critical_section::Mutex;
use ladle_protocol::Order;

/// An order together with its publication count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Published {
    /// Latest order
    pub order: Order,
    /// Bumped on every publish; 0 until the first order arrives
    pub generation: u32,
}

/// Last-write-wins order slot shared by the bus handler and the loop
///
/// Readers see either the old or the new order in full, never a mix.
pub struct OrderCell {
    inner: Mutex<Cell<Published>>,
}

impl Default for OrderCell {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderCell {
    /// Create an empty cell (quantity sentinel, generation 0)
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Published {
                order: Order::none(),
                generation: 0,
            })),
        }
    }

    /// Replace the order; returns the new generation
    pub fn publish(&self, order: Order) -> u32 {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let generation = cell.get().generation.wrapping_add(1);
            cell.set(Published { order, generation });
            generation
        })
    }

    /// Copy out the current order and generation
    pub fn snapshot(&self) -> Published {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }

    /// Current generation
    pub fn generation(&self) -> u32 {
        self.snapshot().generation
    }
}
