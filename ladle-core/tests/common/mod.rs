//! Host fakes shared by the integration tests

#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use ladle_core::station::{StationEvent, StationLoop};
use ladle_core::traits::{
    Direction, PumpDirection, PumpDriver, PumpError, StepperDriver, StepperError,
};
use ladle_hal::RecoveryStore;

/// Stepper that counts steps per direction
#[derive(Debug, Default)]
pub struct RecordingStepper {
    pub forward: u32,
    pub backward: u32,
    pub enabled: bool,
}

impl StepperDriver for RecordingStepper {
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

/// Pump that records every run request
#[derive(Debug, Default)]
pub struct RecordingPump {
    pub runs: Vec<(PumpDirection, u8)>,
    pub running: bool,
}

impl PumpDriver for RecordingPump {
    fn run(&mut self, dir: PumpDirection, duty: u8) -> Result<(), PumpError> {
        self.runs.push((dir, duty));
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PumpError> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Delay that returns immediately
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub fn steppers(n: usize) -> Vec<RecordingStepper> {
    (0..n).map(|_| RecordingStepper::default()).collect()
}

/// Poll every millisecond from `start` until `done` matches an event
///
/// Returns every event seen and the time of the last poll.
pub fn run_until<P, S>(
    station: &mut StationLoop<'_, RecordingStepper, P, S>,
    start: u32,
    limit_ms: u32,
    done: impl Fn(&StationEvent) -> bool,
) -> (Vec<StationEvent>, u32)
where
    P: PumpDriver,
    S: RecoveryStore,
{
    let mut seen = Vec::new();
    for t in start..start + limit_ms {
        let events = station.poll(t);
        let finished = events.iter().any(&done);
        seen.extend(events);
        if finished {
            return (seen, t);
        }
    }
    panic!("no terminal event within {limit_ms} ms");
}
