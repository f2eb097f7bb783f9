//! Boot-time replay of interrupted moves

use embedded_hal::delay::DelayNs;
use ladle_hal::RecoveryStore;

use super::record::{RecoveryError, RecoveryRecord};
use crate::config::AxisConfig;
use crate::traits::{Direction, StepperDriver};

/// Result of replaying one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplayOutcome {
    /// Slot was never written
    Unwritten,
    /// Direction cell was corrupt; nothing was moved
    Corrupt(u16),
    /// Record found but nothing left to do
    Idle,
    /// Axis was driven open-loop
    Replayed {
        direction: Direction,
        elapsed_ms: u16,
        steps: u32,
    },
}

/// Open-loop replayer
///
/// Runs once at boot, before the control loop starts, so it may block.
pub struct Replayer<S, D> {
    store: S,
    delay: D,
}

impl<S: RecoveryStore, D: DelayNs> Replayer<S, D> {
    /// Create a replayer over `store`
    pub fn new(store: S, delay: D) -> Self {
        Self { store, delay }
    }

    /// Give back the store and delay
    pub fn release(self) -> (S, D) {
        (self.store, self.delay)
    }

    /// Replay the record for one axis
    ///
    /// Steps at `axis.replay_speed` in the logged direction for the logged
    /// duration, then clears the elapsed cell so the move is not repeated
    /// on the next boot.
    pub fn replay<M: StepperDriver>(
        &mut self,
        axis: &AxisConfig,
        motor: &mut M,
    ) -> Result<ReplayOutcome, RecoveryError> {
        let record = match RecoveryRecord::read(&mut self.store, &axis.slot) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(ReplayOutcome::Unwritten),
            Err(RecoveryError::CorruptDirection(raw)) => return Ok(ReplayOutcome::Corrupt(raw)),
            Err(e) => return Err(e),
        };

        let direction = match record.direction() {
            Some(dir) if record.is_pending() => dir,
            _ => return Ok(ReplayOutcome::Idle),
        };

        let speed = axis.replay_speed.max(1);
        let steps = (speed as u64 * record.elapsed_ms as u64 / 1000) as u32;

        motor.enable(true)?;
        if steps == 0 {
            self.delay.delay_ms(record.elapsed_ms as u32);
        } else {
            let interval_us = 1_000_000 / speed;
            for _ in 0..steps {
                motor.step(direction)?;
                self.delay.delay_us(interval_us);
            }
        }

        record.cleared().write(&mut self.store, &axis.slot)?;

        Ok(ReplayOutcome::Replayed {
            direction,
            elapsed_ms: record.elapsed_ms,
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use crate::traits::StepperError;
    use ladle_hal::RamEeprom;

    #[derive(Default)]
    struct CountingStepper {
        forward: u32,
        backward: u32,
        enabled: bool,
    }

    impl StepperDriver for CountingStepper {
        fn step(&mut self, dir: Direction) -> Result<(), StepperError> {
            match dir {
                Direction::Forward => self.forward += 1,
                Direction::Backward => self.backward += 1,
            }
            Ok(())
        }

        fn enable(&mut self, enabled: bool) -> Result<(), StepperError> {
            self.enabled = enabled;
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        total_ns: u64,
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    #[test]
    fn test_unwritten_slot_is_skipped() {
        let config = NodeConfig::containers_node();
        let mut replayer = Replayer::new(RamEeprom::<32>::new(), FakeDelay::default());
        let mut motor = CountingStepper::default();

        let outcome = replayer.replay(&config.axes[0], &mut motor).unwrap();
        assert_eq!(outcome, ReplayOutcome::Unwritten);
        assert_eq!(motor.forward + motor.backward, 0);
    }

    #[test]
    fn test_replay_drives_logged_duration() {
        let config = NodeConfig::containers_node();
        let axis = &config.axes[0];
        let mut store = RamEeprom::<32>::new();
        RecoveryRecord::new(Some(Direction::Backward), 250)
            .write(&mut store, &axis.slot)
            .unwrap();

        let mut replayer = Replayer::new(store, FakeDelay::default());
        let mut motor = CountingStepper::default();
        let outcome = replayer.replay(axis, &mut motor).unwrap();

        // 200 steps/s for 250 ms
        assert_eq!(
            outcome,
            ReplayOutcome::Replayed {
                direction: Direction::Backward,
                elapsed_ms: 250,
                steps: 50
            }
        );
        assert_eq!(motor.backward, 50);
        assert!(motor.enabled);

        let (mut store, delay) = replayer.release();
        assert_eq!(delay.total_ns, 50 * 5_000_000);
        assert_eq!(
            RecoveryRecord::read(&mut store, &axis.slot),
            Ok(Some(RecoveryRecord::new(Some(Direction::Backward), 0)))
        );
    }

    #[test]
    fn test_replay_is_one_shot() {
        let config = NodeConfig::lids_node();
        let axis = &config.axes[2];
        let mut store = RamEeprom::<32>::new();
        RecoveryRecord::new(Some(Direction::Forward), 100)
            .write(&mut store, &axis.slot)
            .unwrap();

        let mut replayer = Replayer::new(store, FakeDelay::default());
        let mut motor = CountingStepper::default();
        replayer.replay(axis, &mut motor).unwrap();
        assert_eq!(motor.forward, 20);

        assert_eq!(replayer.replay(axis, &mut motor), Ok(ReplayOutcome::Idle));
        assert_eq!(motor.forward, 20);
    }

    #[test]
    fn test_short_record_only_waits() {
        let mut config = NodeConfig::containers_node();
        config.axes[1].replay_speed = 1;
        let axis = &config.axes[1];
        let mut store = RamEeprom::<32>::new();
        RecoveryRecord::new(Some(Direction::Forward), 300)
            .write(&mut store, &axis.slot)
            .unwrap();

        let mut replayer = Replayer::new(store, FakeDelay::default());
        let mut motor = CountingStepper::default();
        let outcome = replayer.replay(axis, &mut motor).unwrap();
        assert!(matches!(outcome, ReplayOutcome::Replayed { steps: 0, .. }));
        assert_eq!(motor.forward, 0);

        let (_, delay) = replayer.release();
        assert_eq!(delay.total_ns, 300_000_000);
    }

    #[test]
    fn test_corrupt_record_is_skipped() {
        let config = NodeConfig::containers_node();
        let axis = &config.axes[0];
        let mut store = RamEeprom::<32>::new();
        store.write_word(axis.slot.direction_addr, 42).unwrap();
        store.write_word(axis.slot.elapsed_addr, 100).unwrap();

        let mut replayer = Replayer::new(store, FakeDelay::default());
        let mut motor = CountingStepper::default();
        assert_eq!(
            replayer.replay(axis, &mut motor),
            Ok(ReplayOutcome::Corrupt(42))
        );
        assert_eq!(motor.forward + motor.backward, 0);
    }
}
