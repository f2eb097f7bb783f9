//! Embassy async tasks
//!
//! - `bus_rx`: receives order messages from the head unit
//! - `station`: runs the station loop on a 1 ms ticker

mod bus_rx;
mod station;

pub use bus_rx::bus_rx_task;
pub use station::{log_events, station_task};
