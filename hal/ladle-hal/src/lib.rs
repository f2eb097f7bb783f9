//! Ladle Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs. Station logic in `ladle-core` is written against
//! these traits only, so the same choreography and recovery code runs on the
//! board and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (ladle-firmware, tests)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ladle-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ladle-hal-    │       │   RamEeprom   │
//! │    rp2040     │       │  (host/test)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`eeprom::RecoveryStore`] - Word-addressed persistent storage
//! - [`i2c::I2cBus`] - I2C controller writes (coordinator side)
//! - [`i2c::I2cTarget`] - I2C target receive (node side)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod eeprom;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use eeprom::{RamEeprom, RecoveryStore, StoreError, ERASED_WORD};
pub use i2c::{I2cBus, I2cTarget};
