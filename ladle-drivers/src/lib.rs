//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in ladle-core, written against `embedded-hal` 1.0 so any chip HAL can
//! supply the pins:
//!
//! - Stepper drivers (step/dir boards: A4988, DRV8825, TMC2209 standalone)
//! - Pump drivers (brushed DC motor on an H-bridge with PWM enable)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod pump;
pub mod stepper;
