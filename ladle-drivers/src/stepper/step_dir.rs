//! Step/dir stepper driver
//!
//! Drives the common two-wire interface of A4988/DRV8825 style boards: a
//! direction level, a step pulse per (micro)step and an enable line. Pulse
//! timing comes from an `embedded-hal` delay; the motion profile in
//! ladle-core decides when steps are due.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use ladle_core::traits::{Direction, StepperDriver, StepperError};

/// Step/dir timing and polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDirConfig {
    /// Step pulse high time in µs
    pub pulse_us: u32,
    /// Delay after a direction change before the next step, in µs
    pub dir_setup_us: u32,
    /// Enable input is active low (A4988, DRV8825, TMC2209)
    pub enable_active_low: bool,
    /// Swap the meaning of the direction level
    pub invert_direction: bool,
}

impl Default for StepDirConfig {
    fn default() -> Self {
        Self {
            pulse_us: 2,
            dir_setup_us: 1,
            enable_active_low: true,
            invert_direction: false,
        }
    }
}

/// Stepper on step/dir/enable pins
pub struct StepDirStepper<STEP, DIR, EN, D> {
    step: STEP,
    dir: DIR,
    en: EN,
    delay: D,
    config: StepDirConfig,
    direction: Option<Direction>,
    enabled: bool,
}

impl<STEP, DIR, EN, D> StepDirStepper<STEP, DIR, EN, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    D: DelayNs,
{
    /// Create a driver; the motor starts disabled
    pub fn new(step: STEP, dir: DIR, en: EN, delay: D, config: StepDirConfig) -> Self {
        Self {
            step,
            dir,
            en,
            delay,
            config,
            direction: None,
            enabled: false,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &StepDirConfig {
        &self.config
    }

    /// Release the pins and delay
    pub fn release(self) -> (STEP, DIR, EN, D) {
        (self.step, self.dir, self.en, self.delay)
    }

    fn set_direction(&mut self, dir: Direction) -> Result<(), StepperError> {
        if self.direction == Some(dir) {
            return Ok(());
        }
        let high = (dir == Direction::Forward) != self.config.invert_direction;
        self.dir
            .set_state(high.into())
            .map_err(|_| StepperError::Io)?;
        self.direction = Some(dir);
        self.delay.delay_us(self.config.dir_setup_us);
        Ok(())
    }
}

impl<STEP, DIR, EN, D> StepperDriver for StepDirStepper<STEP, DIR, EN, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    D: DelayNs,
{
    fn step(&mut self, dir: Direction) -> Result<(), StepperError> {
        self.set_direction(dir)?;
        self.step.set_high().map_err(|_| StepperError::Io)?;
        self.delay.delay_us(self.config.pulse_us);
        self.step.set_low().map_err(|_| StepperError::Io)?;
        Ok(())
    }

    fn enable(&mut self, enabled: bool) -> Result<(), StepperError> {
        let level = enabled != self.config.enable_active_low;
        self.en
            .set_state(level.into())
            .map_err(|_| StepperError::Io)?;
        self.enabled = enabled;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
