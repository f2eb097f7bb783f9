//! Board wiring
//!
//! Raspberry Pi Pico with external step/dir driver boards and an H-bridge
//! pump driver:
//!
//! | Function      | GPIO          |
//! |---------------|---------------|
//! | I2C0 SDA/SCL  | 4 / 5         |
//! | Axis 0 STEP/DIR/EN | 10 / 11 / 12 |
//! | Axis 1 STEP/DIR/EN | 13 / 14 / 15 |
//! | Axis 2 STEP/DIR/EN | 16 / 17 / 18 |
//! | Pump IN1/IN2  | 20 / 21       |
//! | Pump PWM      | 22 (slice 3A) |
//!
//! Axis drivers are wired in config axis order. The pump pins idle on nodes
//! without pump calibration.

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::PwmOutput;
use embassy_time::Delay;
use ladle_core::station::StationLoop;
use ladle_drivers::pump::HBridgePump;
use ladle_drivers::stepper::StepDirStepper;
use ladle_hal_rp2040::{BusTarget, FlashEeprom};

/// Stepper axis driver
pub type Motor = StepDirStepper<Output<'static>, Output<'static>, Output<'static>, Delay>;

/// Sauce pump driver
pub type Pump = HBridgePump<Output<'static>, Output<'static>, PwmOutput<'static>>;

/// Recovery store
pub type Store = FlashEeprom<'static>;

/// Order bus target
pub type Target = BusTarget<'static, I2C0>;

/// Station loop on this board
pub type Station = StationLoop<'static, Motor, Pump, Store>;

/// PWM counter top: 125 MHz / 25 000 = 5 kHz
pub const PUMP_PWM_TOP: u16 = 25_000;

/// Step/dir driver boards fitted to this board
pub const AXIS_COUNT: usize = 3;
