//! H-bridge pump driver
//!
//! Brushed DC pump on an L298N/TB6612 style bridge:
//! - IN1/IN2 select the direction (both low = coast)
//! - the enable input carries the PWM duty
//!
//! Reversing goes through a stop first so the bridge never sees both
//! inputs switch while the enable is driven.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use ladle_core::traits::{PumpDirection, PumpDriver, PumpError};

/// Full-scale duty of the pump calibration
pub const DUTY_SCALE: u16 = 255;

/// Pump on an H-bridge with a PWM enable
pub struct HBridgePump<IN1, IN2, EN> {
    in1: IN1,
    in2: IN2,
    en: EN,
    running: Option<PumpDirection>,
}

impl<IN1, IN2, EN> HBridgePump<IN1, IN2, EN>
where
    IN1: OutputPin,
    IN2: OutputPin,
    EN: SetDutyCycle,
{
    /// Create a pump driver; call [`PumpDriver::stop`] before first use to
    /// force the pins to a known state
    pub fn new(in1: IN1, in2: IN2, en: EN) -> Self {
        Self {
            in1,
            in2,
            en,
            running: None,
        }
    }

    /// Direction of the running stroke
    pub fn direction(&self) -> Option<PumpDirection> {
        self.running
    }

    /// Release the pins
    pub fn release(self) -> (IN1, IN2, EN) {
        (self.in1, self.in2, self.en)
    }
}

impl<IN1, IN2, EN> PumpDriver for HBridgePump<IN1, IN2, EN>
where
    IN1: OutputPin,
    IN2: OutputPin,
    EN: SetDutyCycle,
{
    fn run(&mut self, dir: PumpDirection, duty: u8) -> Result<(), PumpError> {
        if self.running.is_some_and(|d| d != dir) {
            self.stop()?;
        }

        let forward = dir == PumpDirection::Dispense;
        self.in1
            .set_state(forward.into())
            .map_err(|_| PumpError::Io)?;
        self.in2
            .set_state((!forward).into())
            .map_err(|_| PumpError::Io)?;
        self.en
            .set_duty_cycle_fraction(duty as u16, DUTY_SCALE)
            .map_err(|_| PumpError::Io)?;

        self.running = if duty == 0 { None } else { Some(dir) };
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PumpError> {
        // Clear first so a pin error still reports the pump as stopped
        self.running = None;
        self.en
            .set_duty_cycle_fully_off()
            .map_err(|_| PumpError::Io)?;
        self.in1.set_low().map_err(|_| PumpError::Io)?;
        self.in2.set_low().map_err(|_| PumpError::Io)?;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }
}
