//! Recovery record encoding and throttled logging

use ladle_hal::{RecoveryStore, StoreError, ERASED_WORD};

use crate::config::RecoverySlot;
use crate::traits::{Direction, StepperError};

/// Largest elapsed time that can be logged
///
/// `0xFFFF` is reserved for the erased cell.
pub const MAX_ELAPSED_MS: u16 = ERASED_WORD - 1;

/// Recovery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryError {
    /// Store read or write failed
    Store(StoreError),
    /// Direction cell holds something other than -1, 0 or +1
    CorruptDirection(u16),
    /// Stepper failed during replay
    Stepper(StepperError),
}

impl From<StoreError> for RecoveryError {
    fn from(e: StoreError) -> Self {
        RecoveryError::Store(e)
    }
}

impl From<StepperError> for RecoveryError {
    fn from(e: StepperError) -> Self {
        RecoveryError::Stepper(e)
    }
}

/// Persisted (direction, elapsed-time) pair for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecoveryRecord {
    /// -1, 0 or +1
    pub direction: i8,
    /// Milliseconds the axis would need to finish its leg
    pub elapsed_ms: u16,
}

impl RecoveryRecord {
    /// Record of an axis at rest
    pub const IDLE: Self = Self {
        direction: 0,
        elapsed_ms: 0,
    };

    /// Create a record, clamping elapsed to [`MAX_ELAPSED_MS`]
    pub fn new(direction: Option<Direction>, elapsed_ms: u32) -> Self {
        Self {
            direction: direction.map_or(0, Direction::sign),
            elapsed_ms: elapsed_ms.min(MAX_ELAPSED_MS as u32) as u16,
        }
    }

    /// Travel direction, `None` for a resting axis
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_sign(self.direction)
    }

    /// Check if replaying this record would move the axis
    pub fn is_pending(&self) -> bool {
        self.elapsed_ms > 0 && self.direction != 0
    }

    /// Same direction, zero elapsed time
    pub fn cleared(&self) -> Self {
        Self {
            direction: self.direction,
            elapsed_ms: 0,
        }
    }

    /// Read the record stored in `slot`
    ///
    /// Returns `Ok(None)` when the elapsed cell was never written.
    pub fn read<S: RecoveryStore>(
        store: &mut S,
        slot: &RecoverySlot,
    ) -> Result<Option<Self>, RecoveryError> {
        let elapsed = store.read_word(slot.elapsed_addr)?;
        if elapsed == ERASED_WORD {
            return Ok(None);
        }

        let raw = store.read_word(slot.direction_addr)?;
        let direction = raw as i16;
        if !(-1..=1).contains(&direction) {
            return Err(RecoveryError::CorruptDirection(raw));
        }

        Ok(Some(Self {
            direction: direction as i8,
            elapsed_ms: elapsed,
        }))
    }

    /// Write the record to `slot`, direction first
    pub fn write<S: RecoveryStore>(
        &self,
        store: &mut S,
        slot: &RecoverySlot,
    ) -> Result<(), RecoveryError> {
        store.write_word(slot.direction_addr, self.direction as i16 as u16)?;
        store.write_word(slot.elapsed_addr, self.elapsed_ms)?;
        Ok(())
    }
}

/// Throttled writer for one axis's recovery slot
///
/// Leg transitions are committed immediately; progress updates during a leg
/// are written at most once per `interval_ms`. Words that did not change
/// since the last write are skipped.
#[derive(Debug, Clone)]
pub struct RecoveryLog {
    slot: RecoverySlot,
    interval_ms: u32,
    last_write_ms: Option<u32>,
    last: Option<RecoveryRecord>,
}

impl RecoveryLog {
    /// Create a log for `slot`
    pub fn new(slot: RecoverySlot, interval_ms: u32) -> Self {
        Self {
            slot,
            interval_ms,
            last_write_ms: None,
            last: None,
        }
    }

    /// Slot this log writes to
    pub fn slot(&self) -> &RecoverySlot {
        &self.slot
    }

    /// Last record written, if any
    pub fn last(&self) -> Option<RecoveryRecord> {
        self.last
    }

    /// Write `record` unconditionally (leg start/end)
    pub fn commit<S: RecoveryStore>(
        &mut self,
        store: &mut S,
        record: RecoveryRecord,
        now_ms: u32,
    ) -> Result<(), RecoveryError> {
        match self.last {
            Some(prev) if prev == record => {}
            Some(prev) if prev.direction == record.direction => {
                store.write_word(self.slot.elapsed_addr, record.elapsed_ms)?;
            }
            _ => record.write(store, &self.slot)?,
        }
        self.last = Some(record);
        self.last_write_ms = Some(now_ms);
        Ok(())
    }

    /// Write `record` if the throttle interval has passed
    ///
    /// Returns whether the store was touched.
    pub fn update<S: RecoveryStore>(
        &mut self,
        store: &mut S,
        record: RecoveryRecord,
        now_ms: u32,
    ) -> Result<bool, RecoveryError> {
        let due = match self.last_write_ms {
            Some(t) => now_ms.wrapping_sub(t) >= self.interval_ms,
            None => true,
        };
        if !due || self.last == Some(record) {
            return Ok(false);
        }
        self.commit(store, record, now_ms)?;
        Ok(true)
    }
}
