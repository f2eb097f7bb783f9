//! RP2040-specific HAL for the station-node firmware
//!
//! Implements the shared `ladle-hal` traits on top of `embassy-rp`:
//!
//! - [`eeprom::FlashEeprom`] - recovery words in wear-levelled flash
//! - [`i2c::BusTarget`] - order bus receive side on the I2C target peripheral

#![no_std]

pub mod eeprom;
pub mod i2c;

pub use eeprom::FlashEeprom;
pub use i2c::{BusTarget, BusTargetError};
pub use ladle_hal::{I2cTarget, RecoveryStore, StoreError};
