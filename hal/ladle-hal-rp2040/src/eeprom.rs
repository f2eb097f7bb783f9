//! Emulated EEPROM in RP2040 flash
//!
//! The RP2040 has no EEPROM. Recovery words live in a sequential-storage
//! map in the last 64KB of flash, keyed by their byte address. Every write
//! appends a new item, so the flash wears evenly no matter how often the
//! same word is rewritten.
//!
//! Flash operations are async (DMA) but [`RecoveryStore`] is blocking; the
//! futures are driven to completion with `embassy_futures::block_on`.

use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use ladle_hal::{RecoveryStore, StoreError, ERASED_WORD};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// Flash size on the Pico board
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
/// Size of the recovery partition at the end of flash
pub const RECOVERY_PARTITION_SIZE: usize = 64 * 1024;
/// Start of the recovery partition
pub const RECOVERY_PARTITION_START: usize = FLASH_SIZE - RECOVERY_PARTITION_SIZE;

/// Flash range for the recovery partition
pub const RECOVERY_RANGE: core::ops::Range<u32> =
    (RECOVERY_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Scratch buffer for one map item (key + value + header)
const ITEM_BUFFER: usize = 32;

/// Byte-addressed word store in flash
pub struct FlashEeprom<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> FlashEeprom<'d> {
    /// Create a store on the flash peripheral
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }
}

impl RecoveryStore for FlashEeprom<'_> {
    fn read_word(&mut self, address: u16) -> Result<u16, StoreError> {
        let mut buffer = [0u8; ITEM_BUFFER];
        let value = block_on(map::fetch_item::<u16, u16, _>(
            &mut self.flash,
            RECOVERY_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &address,
        ))
        .map_err(|_| StoreError::Device)?;
        Ok(value.unwrap_or(ERASED_WORD))
    }

    fn write_word(&mut self, address: u16, value: u16) -> Result<(), StoreError> {
        let mut buffer = [0u8; ITEM_BUFFER];
        block_on(map::store_item(
            &mut self.flash,
            RECOVERY_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &address,
            &value,
        ))
        .map_err(|e| match e {
            sequential_storage::Error::FullStorage => StoreError::Full,
            _ => StoreError::Device,
        })
    }

    fn erase(&mut self) -> Result<(), StoreError> {
        block_on(
            self.flash
                .erase(RECOVERY_PARTITION_START as u32, FLASH_SIZE as u32),
        )
        .map_err(|_| StoreError::Device)
    }
}
