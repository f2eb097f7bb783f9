//! Order publication
//!
//! The bus handler runs asynchronously to the control loop and may preempt
//! it. Orders cross that boundary only through an [`OrderCell`], which
//! swaps all four fields under a critical section.

pub mod cell;
pub mod receiver;

pub use cell::{OrderCell, Published};
pub use receiver::BusReceiver;
