//! Pump driver implementations

pub mod hbridge;

pub use hbridge::HBridgePump;
