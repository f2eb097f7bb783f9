//! Board-agnostic core logic for the station-node firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stepper, pump)
//! - Node configuration and calibration constants
//! - Axis motion profile and choreography sequencer
//! - Recovery log and boot-time replay
//! - Order publication between the bus handler and the control loop
//! - Station loop (pipelined module activation) and pump dispensing
//! - Node phase state machine

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod dispense;
pub mod motion;
pub mod recovery;
pub mod state;
pub mod station;
pub mod traits;
