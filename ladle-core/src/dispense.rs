//! Sauce pump dispensing
//!
//! Open-loop, time and torque based: each unit of an order gets one forward
//! stroke at the item's calibrated duty; the pass after the last unit runs
//! the pump in reverse to pull sauce back from the nozzle. Cleaning ignores
//! the item and runs at the clean duty for the clean duration.

use embedded_hal::delay::DelayNs;
use ladle_protocol::ItemCode;

use crate::config::PumpConfig;
use crate::traits::{PumpDirection, PumpDriver, PumpError};

/// Dispense errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispenseError {
    /// Item code has no calibrated duty
    UnknownItem(i16),
    /// Pump driver failure
    Pump(PumpError),
}

impl From<PumpError> for DispenseError {
    fn from(e: PumpError) -> Self {
        DispenseError::Pump(e)
    }
}

/// One timed pump run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stroke {
    /// Forward stroke for one unit
    Dispense { duty: u8 },
    /// Reverse stroke after the last unit
    Purge { duty: u8 },
    /// Clean-in-place run
    Clean { duty: u8 },
}

impl Stroke {
    /// Pump direction for this stroke
    pub fn direction(&self) -> PumpDirection {
        match self {
            Stroke::Dispense { .. } | Stroke::Clean { .. } => PumpDirection::Dispense,
            Stroke::Purge { .. } => PumpDirection::Reverse,
        }
    }

    /// PWM duty for this stroke
    pub fn duty(&self) -> u8 {
        match *self {
            Stroke::Dispense { duty } | Stroke::Purge { duty } | Stroke::Clean { duty } => duty,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Running {
    stroke: Stroke,
    started_ms: u32,
    duration_ms: u32,
}

/// Non-blocking pump controller
pub struct DispenseActuator<P> {
    pump: P,
    config: PumpConfig,
    running: Option<Running>,
}

impl<P: PumpDriver> DispenseActuator<P> {
    /// Create an actuator with the pump stopped
    pub fn new(pump: P, config: PumpConfig) -> Self {
        Self {
            pump,
            config,
            running: None,
        }
    }

    /// Pump calibration
    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Check if a stroke is in progress
    pub fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    /// Access the underlying pump
    pub fn pump_mut(&mut self) -> &mut P {
        &mut self.pump
    }

    /// Stroke for unit `unit` (0-based) of a `quantity`-unit order
    ///
    /// Returns `Ok(None)` past the purge unit.
    pub fn plan(
        &self,
        item: ItemCode,
        unit: u32,
        quantity: u32,
    ) -> Result<Option<Stroke>, DispenseError> {
        if unit > quantity {
            return Ok(None);
        }
        let duty = self
            .config
            .duty_for(item.raw())
            .ok_or(DispenseError::UnknownItem(item.raw()))?;
        if unit < quantity {
            Ok(Some(Stroke::Dispense { duty }))
        } else {
            Ok(Some(Stroke::Purge { duty }))
        }
    }

    /// Clean-in-place stroke
    pub fn clean_stroke(&self) -> Stroke {
        Stroke::Clean {
            duty: self.config.clean_duty,
        }
    }

    /// Configured duration of a stroke (ms)
    pub fn duration(&self, stroke: &Stroke) -> u32 {
        match stroke {
            Stroke::Dispense { .. } => self.config.dispense_ms,
            Stroke::Purge { .. } => self.config.purge_ms,
            Stroke::Clean { .. } => self.config.clean_ms,
        }
    }

    /// Start `stroke` at `now_ms`
    ///
    /// A stroke already running is cut short and replaced.
    pub fn start(&mut self, stroke: Stroke, now_ms: u32) -> Result<(), DispenseError> {
        self.pump.run(stroke.direction(), stroke.duty())?;
        self.running = Some(Running {
            stroke,
            started_ms: now_ms,
            duration_ms: self.duration(&stroke),
        });
        Ok(())
    }

    /// Advance to `now_ms`; returns the stroke that just finished, if any
    pub fn poll(&mut self, now_ms: u32) -> Result<Option<Stroke>, DispenseError> {
        let Some(running) = self.running else {
            return Ok(None);
        };
        if now_ms.wrapping_sub(running.started_ms) < running.duration_ms {
            return Ok(None);
        }
        self.pump.stop()?;
        self.running = None;
        Ok(Some(running.stroke))
    }

    /// Stop the pump and drop any running stroke
    pub fn stop(&mut self) -> Result<(), DispenseError> {
        self.running = None;
        self.pump.stop()?;
        Ok(())
    }

    /// Reverse the pump at power-up to clear the line (blocking)
    ///
    /// Returns whether a purge ran.
    pub fn boot_purge<D: DelayNs>(&mut self, delay: &mut D) -> Result<bool, DispenseError> {
        if self.config.boot_purge_ms == 0 {
            return Ok(false);
        }
        self.pump
            .run(PumpDirection::Reverse, self.config.boot_purge_duty)?;
        delay.delay_ms(self.config.boot_purge_ms);
        self.pump.stop()?;
        Ok(true)
    }
}
