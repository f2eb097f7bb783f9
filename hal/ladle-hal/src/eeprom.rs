//! Persistent word storage abstractions
//!
//! The recovery log needs a small byte-addressable non-volatile memory in the
//! style of an AVR EEPROM: 16-bit words stored little-endian at a fixed byte
//! address, overwritten in place, reading back `0xFF` bytes once erased.
//! Chip HALs map this onto whatever they have (emulated EEPROM in flash,
//! external I2C EEPROM, FRAM).

/// Value read back from a word that was never written (erased cells)
pub const ERASED_WORD: u16 = 0xFFFF;

/// Errors from persistent storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Address (plus the word's second byte) is outside the device
    OutOfRange,
    /// Underlying flash/EEPROM operation failed
    Device,
    /// Storage is full (wear-levelled implementations)
    Full,
}

/// Word-addressed persistent storage
///
/// A word occupies the bytes at `address` (low byte) and `address + 1`
/// (high byte). Writes are unconditional overwrites; there is no versioning.
pub trait RecoveryStore {
    /// Read the 16-bit word at `address`
    ///
    /// Returns [`ERASED_WORD`] for a word that was never written.
    fn read_word(&mut self, address: u16) -> Result<u16, StoreError>;

    /// Write the 16-bit word at `address`
    fn write_word(&mut self, address: u16, value: u16) -> Result<(), StoreError>;

    /// Erase the whole store
    ///
    /// Every word reads back as [`ERASED_WORD`] afterwards.
    fn erase(&mut self) -> Result<(), StoreError>;
}

impl<T: RecoveryStore + ?Sized> RecoveryStore for &mut T {
    fn read_word(&mut self, address: u16) -> Result<u16, StoreError> {
        (**self).read_word(address)
    }

    fn write_word(&mut self, address: u16, value: u16) -> Result<(), StoreError> {
        (**self).write_word(address, value)
    }

    fn erase(&mut self) -> Result<(), StoreError> {
        (**self).erase()
    }
}

/// RAM-backed byte store with EEPROM semantics
///
/// Used as the reference [`RecoveryStore`] in host tests and simulation.
/// Tracks a write counter so callers can check how hard they hit the cells.
#[derive(Debug, Clone)]
pub struct RamEeprom<const N: usize> {
    cells: [u8; N],
    writes: u32,
}

impl<const N: usize> Default for RamEeprom<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamEeprom<N> {
    /// Create a freshly erased store
    pub const fn new() -> Self {
        Self {
            cells: [0xFF; N],
            writes: 0,
        }
    }

    /// Raw byte view (for inspection in tests)
    pub fn bytes(&self) -> &[u8; N] {
        &self.cells
    }

    /// Number of word writes performed since creation
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    fn check(address: u16) -> Result<usize, StoreError> {
        let addr = address as usize;
        if addr + 1 >= N {
            return Err(StoreError::OutOfRange);
        }
        Ok(addr)
    }
}

impl<const N: usize> RecoveryStore for RamEeprom<N> {
    fn read_word(&mut self, address: u16) -> Result<u16, StoreError> {
        let addr = Self::check(address)?;
        Ok(u16::from_le_bytes([self.cells[addr], self.cells[addr + 1]]))
    }

    fn write_word(&mut self, address: u16, value: u16) -> Result<(), StoreError> {
        let addr = Self::check(address)?;
        let [low, high] = value.to_le_bytes();
        self.cells[addr] = low;
        self.cells[addr + 1] = high;
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }

    fn erase(&mut self) -> Result<(), StoreError> {
        self.cells = [0xFF; N];
        Ok(())
    }
}
