//! Station loop
//!
//! Every node runs the same loop: adopt the latest order at a pass
//! boundary, start the modules whose activation window covers the current
//! pass, poll them until all are done, wait for the conveyor to settle and
//! count the pass. Nodes never talk to each other; the per-module pipeline
//! offset lines them up on the same physical item.

pub mod events;
pub mod node;
pub mod runner;
pub mod window;

pub use events::{StationEvent, MAX_EVENTS};
pub use node::NodeState;
pub use runner::StationLoop;
pub use window::ActivationWindow;
