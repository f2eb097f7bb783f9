//! Ladle - Dispensing Line Station Node Firmware
//!
//! Main firmware binary for the RP2040 station nodes. A node listens for
//! production orders from the head unit on I2C and runs its fork, stamp and
//! pump modules in lockstep with the rest of the line.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c_slave::{self, I2cSlave};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::{self, Pwm};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ladle_core::bus::OrderCell;
use ladle_core::station::StationLoop;
use ladle_drivers::pump::HBridgePump;
use ladle_drivers::stepper::{StepDirConfig, StepDirStepper};
use ladle_hal_rp2040::{BusTarget, FlashEeprom};

use crate::board::{Motor, Station, AXIS_COUNT, PUMP_PWM_TOP};

mod board;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => embassy_rp::i2c::InterruptHandler<I2C0>;
});

/// Latest order from the head unit, shared by the bus and station tasks
static ORDER: OrderCell = OrderCell::new();

// Station loop must live forever for the station task
static STATION: StaticCell<Station> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Ladle node firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load_config();

    // Step/dir drivers in config axis order
    let motors: [Motor; AXIS_COUNT] = [
        stepper(
            Output::new(p.PIN_10, Level::Low),
            Output::new(p.PIN_11, Level::Low),
            Output::new(p.PIN_12, Level::High),
        ),
        stepper(
            Output::new(p.PIN_13, Level::Low),
            Output::new(p.PIN_14, Level::Low),
            Output::new(p.PIN_15, Level::High),
        ),
        stepper(
            Output::new(p.PIN_16, Level::Low),
            Output::new(p.PIN_17, Level::Low),
            Output::new(p.PIN_18, Level::High),
        ),
    ];
    if config.axes.len() > AXIS_COUNT {
        warn!(
            "Configuration names {} axes, board has {}",
            config.axes.len(),
            AXIS_COUNT
        );
    }

    // Pump H-bridge: direction inputs plus PWM enable
    let mut pwm_config = pwm::Config::default();
    pwm_config.top = PUMP_PWM_TOP;
    let (pump_en, _) = Pwm::new_output_a(p.PWM_SLICE3, p.PIN_22, pwm_config).split();
    let pump = HBridgePump::new(
        Output::new(p.PIN_20, Level::Low),
        Output::new(p.PIN_21, Level::Low),
        unwrap!(pump_en),
    );
    info!("Motor outputs initialized");

    let store = FlashEeprom::new(p.FLASH, p.DMA_CH0);

    let station = match StationLoop::new(&config, motors, pump, store, &ORDER) {
        Ok(station) => STATION.init(station),
        Err(e) => {
            error!("Configuration rejected by station loop: {}", e);
            return;
        }
    };

    // Replay interrupted moves and purge the pump line before taking orders
    info!("Replaying recovery records");
    let events = station.boot(&mut Delay);
    tasks::log_events(&events);

    // I2C target on this node's bus address
    let mut i2c_config = i2c_slave::Config::default();
    i2c_config.addr = config.address as u16;
    let i2c = I2cSlave::new(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config);
    info!("Listening on bus address {}", config.address);

    // Spawn tasks
    spawner
        .spawn(tasks::bus_rx_task(BusTarget::new(i2c), &ORDER))
        .unwrap();
    spawner.spawn(tasks::station_task(station)).unwrap();

    info!("All tasks spawned, node running");
}

/// Step/dir driver with active-low enable, disabled until first move
fn stepper(step: Output<'static>, dir: Output<'static>, en: Output<'static>) -> Motor {
    StepDirStepper::new(step, dir, en, Delay, StepDirConfig::default())
}
