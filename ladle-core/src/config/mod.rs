//! Configuration types
//!
//! Board-agnostic node configuration. Timing and geometry constants are
//! calibrated per deployment; the firmware embeds them as postcard binary
//! generated from the node's TOML file at build time.

pub mod calibration;
pub mod types;

pub use types::*;
