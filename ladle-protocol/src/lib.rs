//! Ladle order broadcast protocol
//!
//! This crate defines the I2C payload the head unit writes to each station
//! node. The protocol is a single fixed-size message with no framing, no
//! checksum and no acknowledgement:
//!
//! ```text
//! ┌────────────┬────────────┬──────┬───────┐
//! │ QUANTITY   │ ITEM       │ SOAP │ RINSE │
//! │ i16 LE     │ i16 LE     │ 1B   │ 1B    │
//! └────────────┴────────────┴──────┴───────┘
//! ```
//!
//! A flag byte is true when nonzero. Anything that is not exactly
//! [`ORDER_MESSAGE_LEN`] bytes long is rejected rather than partially decoded.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod address;
pub mod order;

pub use address::{broadcast, NodeAddress};
pub use order::{ItemCode, MessageError, Order, ORDER_MESSAGE_LEN, QUANTITY_NONE};
