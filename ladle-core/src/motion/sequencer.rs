//! Choreography sequencer
//!
//! A choreography is a fixed list of moves and holds. The sequencer walks
//! it one poll at a time, ticking the active axis and keeping each axis's
//! recovery record current:
//!
//! - outbound legs log `(direction, now - leg_start)`
//! - return legs log `(direction, full_stroke - (now - leg_start))`
//! - every finished leg logs `(direction, 0)`

use heapless::Vec;
use ladle_hal::RecoveryStore;

use super::axis::{Axis, Leg};
use crate::config::ModuleKind;
use crate::recovery::{RecoveryError, RecoveryRecord};
use crate::traits::{Direction, StepperDriver, StepperError};

/// Maximum steps in one choreography
pub const MAX_CHOREO_STEPS: usize = 8;

/// Motion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Leg exceeded the axis stall timeout or the driver reported a stall
    Stalled { axis: u8 },
    /// Choreography references an axis the node does not have
    UnknownAxis(u8),
    /// Stepper driver failure
    Stepper(StepperError),
    /// Recovery log write failure
    Recovery(RecoveryError),
}

impl From<StepperError> for MotionError {
    fn from(e: StepperError) -> Self {
        MotionError::Stepper(e)
    }
}

impl From<RecoveryError> for MotionError {
    fn from(e: RecoveryError) -> Self {
        MotionError::Recovery(e)
    }
}

/// Reported sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// Nothing running
    Idle,
    /// An axis is travelling home -> target
    MovingForward,
    /// Pausing at a target
    HoldAtTarget,
    /// An axis is travelling target -> home
    ReturningHome,
}

/// One choreography step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChoreoStep {
    /// Drive an axis through one leg; done when remaining distance is 0
    Move { axis: u8, leg: Leg },
    /// Wait
    Hold { ms: u32 },
}

impl ChoreoStep {
    fn state(&self) -> SequencerState {
        match self {
            ChoreoStep::Move {
                leg: Leg::Outbound, ..
            } => SequencerState::MovingForward,
            ChoreoStep::Move {
                leg: Leg::Return, ..
            } => SequencerState::ReturningHome,
            ChoreoStep::Hold { .. } => SequencerState::HoldAtTarget,
        }
    }
}

/// Scripted move list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choreography {
    steps: Vec<ChoreoStep, MAX_CHOREO_STEPS>,
}

impl Choreography {
    /// Fork pair: lead out, hold, follower out, hold, follower back, lead back
    pub fn fork_pair(lead: u8, follower: u8, hold_ms: u32) -> Self {
        Self::from_steps(&[
            ChoreoStep::Move {
                axis: lead,
                leg: Leg::Outbound,
            },
            ChoreoStep::Hold { ms: hold_ms },
            ChoreoStep::Move {
                axis: follower,
                leg: Leg::Outbound,
            },
            ChoreoStep::Hold { ms: hold_ms },
            ChoreoStep::Move {
                axis: follower,
                leg: Leg::Return,
            },
            ChoreoStep::Move {
                axis: lead,
                leg: Leg::Return,
            },
        ])
    }

    /// Stamp: press, dwell, return
    pub fn stamp(axis: u8, hold_ms: u32) -> Self {
        Self::from_steps(&[
            ChoreoStep::Move {
                axis,
                leg: Leg::Outbound,
            },
            ChoreoStep::Hold { ms: hold_ms },
            ChoreoStep::Move {
                axis,
                leg: Leg::Return,
            },
        ])
    }

    /// Choreography for a module, `None` for modules without axes
    pub fn for_module(kind: &ModuleKind) -> Option<Self> {
        match *kind {
            ModuleKind::ForkPair {
                lead,
                follower,
                hold_ms,
            } => Some(Self::fork_pair(lead, follower, hold_ms)),
            ModuleKind::Stamp { axis, hold_ms } => Some(Self::stamp(axis, hold_ms)),
            ModuleKind::Pump => None,
        }
    }

    fn from_steps(steps: &[ChoreoStep]) -> Self {
        let mut out = Vec::new();
        for step in steps.iter().take(MAX_CHOREO_STEPS) {
            let _ = out.push(*step);
        }
        Self { steps: out }
    }

    /// Steps in order
    pub fn steps(&self) -> &[ChoreoStep] {
        &self.steps
    }

    /// Axes this choreography moves
    pub fn axes(&self) -> impl Iterator<Item = u8> + '_ {
        self.steps.iter().filter_map(|s| match s {
            ChoreoStep::Move { axis, .. } => Some(*axis),
            ChoreoStep::Hold { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveStep {
    index: usize,
    started_ms: u32,
    direction: Option<Direction>,
}

/// Resumable choreography runner
#[derive(Debug, Clone)]
pub struct Sequencer {
    choreography: Choreography,
    active: Option<ActiveStep>,
    pending_start: bool,
    cycles: u32,
}

impl Sequencer {
    /// Create an idle sequencer
    pub fn new(choreography: Choreography) -> Self {
        Self {
            choreography,
            active: None,
            pending_start: false,
            cycles: 0,
        }
    }

    /// Choreography being run
    pub fn choreography(&self) -> &Choreography {
        &self.choreography
    }

    /// Completed cycles since creation
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Check if a cycle is in progress
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || self.pending_start
    }

    /// Current state
    pub fn state(&self) -> SequencerState {
        match self.active {
            Some(a) => self.choreography.steps[a.index].state(),
            None if self.pending_start => self.choreography.steps[0].state(),
            None => SequencerState::Idle,
        }
    }

    /// Request one cycle; the first step begins on the next poll
    ///
    /// Ignored while a cycle is already running.
    pub fn start(&mut self) {
        if !self.is_busy() && !self.choreography.steps.is_empty() {
            self.pending_start = true;
        }
    }

    /// Abandon the current cycle without touching the axes
    pub fn abort(&mut self) {
        self.active = None;
        self.pending_start = false;
    }

    /// Advance the choreography to `now_ms`
    ///
    /// Zero-length steps (an axis already at its leg target, an elapsed
    /// hold) are chained within the same poll.
    pub fn poll<M, S>(
        &mut self,
        axes: &mut [Axis<M>],
        store: &mut S,
        now_ms: u32,
    ) -> Result<SequencerState, MotionError>
    where
        M: StepperDriver,
        S: RecoveryStore,
    {
        if self.pending_start {
            self.pending_start = false;
            self.begin(0, axes, store, now_ms)?;
        }

        while let Some(active) = self.active {
            let step = self.choreography.steps[active.index];
            let done = match step {
                ChoreoStep::Hold { ms } => now_ms.wrapping_sub(active.started_ms) >= ms,
                ChoreoStep::Move { axis, leg } => {
                    self.tick_leg(axis, leg, active, axes, store, now_ms)?
                }
            };

            if !done {
                return Ok(step.state());
            }

            let next = active.index + 1;
            if next < self.choreography.steps.len() {
                self.begin(next, axes, store, now_ms)?;
            } else {
                self.active = None;
                self.cycles = self.cycles.wrapping_add(1);
            }
        }

        Ok(SequencerState::Idle)
    }

    fn begin<M, S>(
        &mut self,
        index: usize,
        axes: &mut [Axis<M>],
        store: &mut S,
        now_ms: u32,
    ) -> Result<(), MotionError>
    where
        M: StepperDriver,
        S: RecoveryStore,
    {
        let mut direction = None;
        if let ChoreoStep::Move { axis, leg } = self.choreography.steps[index] {
            let a = axes
                .get_mut(axis as usize)
                .ok_or(MotionError::UnknownAxis(axis))?;
            let target = a.leg_target(leg);
            a.driver.enable(true)?;
            a.driver.move_to(target);
            direction = a.driver.direction();

            if direction.is_some() {
                let elapsed = match leg {
                    Leg::Outbound => 0,
                    Leg::Return => a.full_stroke_ms() as u32,
                };
                a.log
                    .commit(store, RecoveryRecord::new(direction, elapsed), now_ms)?;
            }
        }

        self.active = Some(ActiveStep {
            index,
            started_ms: now_ms,
            direction,
        });
        Ok(())
    }

    fn tick_leg<M, S>(
        &mut self,
        axis: u8,
        leg: Leg,
        active: ActiveStep,
        axes: &mut [Axis<M>],
        store: &mut S,
        now_ms: u32,
    ) -> Result<bool, MotionError>
    where
        M: StepperDriver,
        S: RecoveryStore,
    {
        let a = axes
            .get_mut(axis as usize)
            .ok_or(MotionError::UnknownAxis(axis))?;

        let remaining = a.driver.tick(now_ms)?;
        if remaining == 0 {
            if active.direction.is_some() {
                a.log
                    .commit(store, RecoveryRecord::new(active.direction, 0), now_ms)?;
            }
            return Ok(true);
        }

        let since_start = now_ms.wrapping_sub(active.started_ms);
        if a.driver.is_stalled() || since_start > a.stall_timeout_ms() {
            a.driver.stop();
            return Err(MotionError::Stalled { axis });
        }

        let elapsed = match leg {
            Leg::Outbound => since_start,
            Leg::Return => (a.full_stroke_ms() as u32).saturating_sub(since_start),
        };
        a.log
            .update(store, RecoveryRecord::new(active.direction, elapsed), now_ms)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use ladle_hal::RamEeprom;

    #[derive(Default)]
    struct FakeStepper {
        steps: u32,
        enabled: bool,
        stalled: bool,
    }

    impl StepperDriver for FakeStepper {
        fn step(&mut self, _dir: Direction) -> Result<(), StepperError> {
            self.steps += 1;
            Ok(())
        }

        fn enable(&mut self, enabled: bool) -> Result<(), StepperError> {
            self.enabled = enabled;
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn is_stalled(&self) -> bool {
            self.stalled
        }
    }

    fn containers_axes() -> [Axis<FakeStepper>; 2] {
        let config = NodeConfig::containers_node();
        [
            Axis::from_config(FakeStepper::default(), &config.axes[0], 50),
            Axis::from_config(FakeStepper::default(), &config.axes[1], 50),
        ]
    }

    #[test]
    fn test_fork_pair_order() {
        let choreo = Choreography::fork_pair(1, 0, 250);
        let moves: std::vec::Vec<u8> = choreo.axes().collect();
        assert_eq!(moves, [1, 0, 0, 1]);
        assert_eq!(choreo.steps().len(), 6);
    }

    #[test]
    fn test_pump_has_no_choreography() {
        assert!(Choreography::for_module(&ModuleKind::Pump).is_none());
        assert_eq!(
            Choreography::for_module(&ModuleKind::Stamp {
                axis: 2,
                hold_ms: 100
            }),
            Some(Choreography::stamp(2, 100))
        );
    }

    #[test]
    fn test_fork_cycle_runs_to_idle() {
        let mut axes = containers_axes();
        let mut store = RamEeprom::<32>::new();
        let mut seq = Sequencer::new(Choreography::fork_pair(1, 0, 250));

        assert_eq!(seq.state(), SequencerState::Idle);
        seq.start();
        assert_eq!(seq.state(), SequencerState::MovingForward);

        let mut seen = std::vec::Vec::new();
        let mut t = 0;
        while t < 20_000 {
            let state = seq.poll(&mut axes, &mut store, t).unwrap();
            if seen.last() != Some(&state) {
                seen.push(state);
            }
            if state == SequencerState::Idle {
                break;
            }
            t += 1;
        }

        assert_eq!(
            seen,
            [
                SequencerState::MovingForward,
                SequencerState::HoldAtTarget,
                SequencerState::MovingForward,
                SequencerState::HoldAtTarget,
                SequencerState::ReturningHome,
                SequencerState::Idle,
            ]
        );
        assert_eq!(seq.cycles(), 1);
        assert!(!seq.is_busy());
        assert_eq!(axes[0].driver.position(), 200);
        assert_eq!(axes[1].driver.position(), 0);
        assert_eq!(axes[0].driver.motor_mut().steps, 400);
        assert_eq!(axes[1].driver.motor_mut().steps, 400);

        // Both legs closed out: nothing to replay
        for axis in &axes {
            let record = RecoveryRecord::read(&mut store, axis.log.slot()).unwrap();
            assert_eq!(record.map(|r| r.elapsed_ms), Some(0));
        }
    }

    #[test]
    fn test_outbound_logs_elapsed() {
        let mut axes = containers_axes();
        let mut store = RamEeprom::<32>::new();
        let mut seq = Sequencer::new(Choreography::fork_pair(1, 0, 250));
        seq.start();
        for t in 0..=300 {
            seq.poll(&mut axes, &mut store, t).unwrap();
        }

        // C-fork (axis 1) moves forward, throttled at 50 ms
        let record = RecoveryRecord::read(&mut store, axes[1].log.slot())
            .unwrap()
            .unwrap();
        assert_eq!(record.direction, 1);
        assert_eq!(record.elapsed_ms, 300);
    }

    #[test]
    fn test_return_logs_time_to_finish() {
        let config = NodeConfig::lids_node();
        let mut axes = [
            Axis::from_config(FakeStepper::default(), &config.axes[0], 50),
            Axis::from_config(FakeStepper::default(), &config.axes[1], 50),
            Axis::from_config(FakeStepper::default(), &config.axes[2], 50),
        ];
        let mut store = RamEeprom::<32>::new();
        let mut seq = Sequencer::new(Choreography::stamp(2, 100));
        seq.start();

        let mut t = 0;
        while seq.poll(&mut axes, &mut store, t).unwrap() != SequencerState::ReturningHome {
            t += 1;
        }
        let return_start = t;
        let record = RecoveryRecord::read(&mut store, axes[2].log.slot())
            .unwrap()
            .unwrap();
        assert_eq!(record.direction, -1);
        assert_eq!(record.elapsed_ms, 200);

        for _ in 0..100 {
            t += 1;
            seq.poll(&mut axes, &mut store, t).unwrap();
        }
        let record = RecoveryRecord::read(&mut store, axes[2].log.slot())
            .unwrap()
            .unwrap();
        assert_eq!(record.elapsed_ms as u32, 200 - (t - return_start));

        // The countdown runs on the calibrated stroke time, not the profile:
        // it reaches zero while the stamp is still travelling home
        for _ in 0..150 {
            t += 1;
            seq.poll(&mut axes, &mut store, t).unwrap();
        }
        let record = RecoveryRecord::read(&mut store, axes[2].log.slot())
            .unwrap()
            .unwrap();
        assert_eq!(record.elapsed_ms, 0);
        assert!(axes[2].driver.remaining() > 0);
        assert_eq!(seq.state(), SequencerState::ReturningHome);
    }

    #[test]
    fn test_stall_timeout() {
        let mut config = NodeConfig::containers_node();
        config.axes[1].stall_timeout_ms = 100;
        let mut axes = [
            Axis::from_config(FakeStepper::default(), &config.axes[0], 50),
            Axis::from_config(FakeStepper::default(), &config.axes[1], 50),
        ];
        let mut store = RamEeprom::<32>::new();
        let mut seq = Sequencer::new(Choreography::fork_pair(1, 0, 250));
        seq.start();

        let mut result = Ok(SequencerState::Idle);
        for t in 0..200 {
            result = seq.poll(&mut axes, &mut store, t);
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result, Err(MotionError::Stalled { axis: 1 }));
        assert_eq!(axes[1].driver.remaining(), 0);
    }

    #[test]
    fn test_driver_stall_flag() {
        let mut axes = containers_axes();
        axes[1].driver.motor_mut().stalled = true;
        let mut store = RamEeprom::<32>::new();
        let mut seq = Sequencer::new(Choreography::fork_pair(1, 0, 250));
        seq.start();

        assert_eq!(
            seq.poll(&mut axes, &mut store, 0),
            Err(MotionError::Stalled { axis: 1 })
        );
    }

    #[test]
    fn test_unknown_axis() {
        let mut axes = containers_axes();
        let mut store = RamEeprom::<32>::new();
        let mut seq = Sequencer::new(Choreography::stamp(5, 100));
        seq.start();
        assert_eq!(
            seq.poll(&mut axes, &mut store, 0),
            Err(MotionError::UnknownAxis(5))
        );
    }
}
