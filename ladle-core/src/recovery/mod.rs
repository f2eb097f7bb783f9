//! Power-loss recovery
//!
//! Every axis leg leaves a (direction, elapsed-ms) record in the recovery
//! store. At boot the [`Replayer`] runs each axis open-loop for the logged
//! duration to approximate finishing the interrupted move. Repeated
//! crash/restart cycles accumulate drift; there is no position feedback.

pub mod record;
pub mod replay;

pub use record::{RecoveryError, RecoveryLog, RecoveryRecord, MAX_ELAPSED_MS};
pub use replay::{ReplayOutcome, Replayer};
