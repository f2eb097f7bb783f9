//! Axis driver with a trapezoidal step profile
//!
//! Non-blocking: each [`AxisDriver::tick`] emits the steps that became due
//! since the previous tick and reports the remaining distance.

use crate::config::AxisConfig;
use crate::recovery::RecoveryLog;
use crate::traits::{Direction, StepperDriver, StepperError};

/// Speed floor while moving (milli-steps/s), capped at the axis max speed
///
/// Guarantees every move finishes in a bounded number of ticks.
pub const MIN_SPEED_MILLI: u64 = 10_000;

/// Largest time step accepted by one tick (ms)
///
/// A late tick does not turn into a burst of steps.
pub const MAX_TICK_MS: u32 = 50;

const MICRO: u64 = 1_000_000;

/// Current motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// Axis is at its target
    Stopped,
    /// Ramping up toward max speed
    Accelerating,
    /// Cruising at max speed
    AtSpeed,
    /// Ramping down to land on the target
    Decelerating,
}

/// Position/speed profile driving one stepper
#[derive(Debug)]
pub struct AxisDriver<M> {
    motor: M,
    position: i32,
    target: i32,
    /// Max speed in milli-steps/s
    max_speed_milli: u64,
    /// Acceleration in steps/s²
    acceleration: u64,
    /// Current speed in milli-steps/s
    speed_milli: u64,
    /// Fractional step accumulator in micro-steps
    accum: u64,
    last_tick_ms: Option<u32>,
    state: MotionState,
}

impl<M: StepperDriver> AxisDriver<M> {
    /// Create a driver at `position`
    pub fn new(motor: M, position: i32, max_speed: u32, acceleration: u32) -> Self {
        Self {
            motor,
            position,
            target: position,
            max_speed_milli: max_speed.max(1) as u64 * 1000,
            acceleration: acceleration.max(1) as u64,
            speed_milli: 0,
            accum: 0,
            last_tick_ms: None,
            state: MotionState::Stopped,
        }
    }

    /// Current position in steps
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Target position in steps
    pub fn target(&self) -> i32 {
        self.target
    }

    /// Current speed in steps/s
    pub fn speed(&self) -> u32 {
        (self.speed_milli / 1000) as u32
    }

    /// Current motion state
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Absolute remaining distance
    pub fn remaining(&self) -> u32 {
        self.target.abs_diff(self.position)
    }

    /// Direction of the current move, `None` when at target
    pub fn direction(&self) -> Option<Direction> {
        Direction::toward(self.position, self.target)
    }

    /// Check if the driver reports a stall
    pub fn is_stalled(&self) -> bool {
        self.motor.is_stalled()
    }

    /// Start a move toward `target` from standstill
    pub fn move_to(&mut self, target: i32) {
        self.target = target;
        self.speed_milli = 0;
        self.accum = 0;
        self.last_tick_ms = None;
        self.state = if self.remaining() == 0 {
            MotionState::Stopped
        } else {
            MotionState::Accelerating
        };
    }

    /// Drop the target and stop immediately
    pub fn stop(&mut self) {
        self.target = self.position;
        self.speed_milli = 0;
        self.accum = 0;
        self.state = MotionState::Stopped;
    }

    /// Enable or disable the motor driver
    pub fn enable(&mut self, enabled: bool) -> Result<(), StepperError> {
        self.motor.enable(enabled)
    }

    /// Underlying motor
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// Access the underlying motor
    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }

    /// Stopping distance at the current speed in steps (rounded up)
    fn stopping_distance(&self) -> u64 {
        let v = self.speed_milli;
        v.saturating_mul(v).div_ceil(2 * self.acceleration * MICRO)
    }

    /// Advance the profile to `now_ms`
    ///
    /// Emits every step that became due and returns the remaining distance.
    /// The first tick after [`AxisDriver::move_to`] only starts the clock.
    pub fn tick(&mut self, now_ms: u32) -> Result<u32, StepperError> {
        let remaining = self.remaining();
        if remaining == 0 {
            self.speed_milli = 0;
            self.state = MotionState::Stopped;
            return Ok(0);
        }

        let last = match self.last_tick_ms.replace(now_ms) {
            Some(last) => last,
            None => return Ok(remaining),
        };
        let dt = now_ms.wrapping_sub(last).min(MAX_TICK_MS) as u64;
        if dt == 0 {
            return Ok(remaining);
        }

        let dv = self.acceleration * dt;
        let floor = MIN_SPEED_MILLI.min(self.max_speed_milli);
        if self.stopping_distance() >= remaining as u64 {
            self.speed_milli = self.speed_milli.saturating_sub(dv).max(floor);
            self.state = MotionState::Decelerating;
        } else if self.speed_milli < self.max_speed_milli {
            self.speed_milli = (self.speed_milli + dv).clamp(floor, self.max_speed_milli);
            self.state = MotionState::Accelerating;
        } else {
            self.state = MotionState::AtSpeed;
        }

        self.accum += self.speed_milli * dt;
        let due = (self.accum / MICRO).min(remaining as u64) as u32;
        self.accum -= due as u64 * MICRO;

        let Some(dir) = self.direction() else {
            return Ok(0);
        };
        for _ in 0..due {
            self.motor.step(dir)?;
            self.position += dir.sign() as i32;
        }

        let remaining = self.remaining();
        if remaining == 0 {
            self.speed_milli = 0;
            self.accum = 0;
            self.state = MotionState::Stopped;
        }
        Ok(remaining)
    }
}

/// Leg of a choreography move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Leg {
    /// Home to target
    Outbound,
    /// Target back to home
    Return,
}

/// One configured axis: profile, geometry and recovery log
#[derive(Debug)]
pub struct Axis<M> {
    /// Step profile
    pub driver: AxisDriver<M>,
    /// Recovery log for this axis's slot
    pub log: RecoveryLog,
    home: i32,
    outbound_target: i32,
    full_stroke_ms: u16,
    stall_timeout_ms: u32,
}

impl<M: StepperDriver> Axis<M> {
    /// Build an axis at its home position
    pub fn from_config(motor: M, config: &AxisConfig, persist_interval_ms: u32) -> Self {
        Self {
            driver: AxisDriver::new(
                motor,
                config.home_position,
                config.max_speed,
                config.acceleration,
            ),
            log: RecoveryLog::new(config.slot, persist_interval_ms),
            home: config.home_position,
            outbound_target: config.target_position,
            full_stroke_ms: config.full_stroke_ms,
            stall_timeout_ms: config.stall_timeout_ms,
        }
    }

    /// Position a leg ends at
    pub fn leg_target(&self, leg: Leg) -> i32 {
        match leg {
            Leg::Outbound => self.outbound_target,
            Leg::Return => self.home,
        }
    }

    /// Calibrated full-stroke duration (ms)
    pub fn full_stroke_ms(&self) -> u16 {
        self.full_stroke_ms
    }

    /// Per-leg stall bound (ms)
    pub fn stall_timeout_ms(&self) -> u32 {
        self.stall_timeout_ms
    }
}
