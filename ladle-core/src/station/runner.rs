//! Station loop driver

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use ladle_hal::RecoveryStore;

use super::events::{StationEvent, MAX_EVENTS};
use super::node::NodeState;
use super::window::ActivationWindow;
use crate::bus::OrderCell;
use crate::config::{ConfigError, NodeConfig, MAX_AXES, MAX_MODULES};
use crate::dispense::{DispenseActuator, DispenseError};
use crate::motion::{Axis, Choreography, MotionError, Sequencer, SequencerState};
use crate::recovery::{RecoveryError, Replayer};
use crate::state::{ErrorKind, Event, Phase};
use crate::traits::{PumpDriver, StepperDriver};

type Events = Vec<StationEvent, MAX_EVENTS>;

fn push(events: &mut Events, event: StationEvent) {
    let pushed = events.push(event);
    debug_assert!(pushed.is_ok(), "station event buffer full");
}

impl From<MotionError> for ErrorKind {
    fn from(e: MotionError) -> Self {
        match e {
            MotionError::Stalled { .. } => ErrorKind::MotorStall,
            MotionError::Stepper(_) => ErrorKind::StepperFault,
            MotionError::UnknownAxis(_) => ErrorKind::ConfigFault,
            MotionError::Recovery(e) => e.into(),
        }
    }
}

impl From<RecoveryError> for ErrorKind {
    fn from(e: RecoveryError) -> Self {
        match e {
            RecoveryError::Stepper(_) => ErrorKind::StepperFault,
            RecoveryError::Store(_) | RecoveryError::CorruptDirection(_) => ErrorKind::StoreFault,
        }
    }
}

#[derive(Debug)]
enum Runner {
    Motion(Sequencer),
    Pump,
}

#[derive(Debug)]
struct Module {
    offset: u16,
    runner: Runner,
    active: bool,
}

impl Module {
    /// Window for an order of `units`; the pump gets one extra pass to purge
    fn window(&self, units: u32) -> ActivationWindow {
        let len = match self.runner {
            Runner::Motion(_) => units,
            Runner::Pump if units > 0 => units + 1,
            Runner::Pump => 0,
        };
        ActivationWindow::new(self.offset as u32, len)
    }
}

/// Per-node control loop
///
/// Owns the node's axes, pump and recovery store. Poll it from a periodic
/// task; every call is non-blocking except [`StationLoop::boot`].
pub struct StationLoop<'a, M, P, S> {
    cell: &'a OrderCell,
    config: NodeConfig,
    axes: Vec<Axis<M>, MAX_AXES>,
    modules: Vec<Module, MAX_MODULES>,
    pump: Option<DispenseActuator<P>>,
    store: S,
    state: NodeState,
    pass_started_ms: u32,
    settle_started_ms: u32,
}

impl<'a, M, P, S> StationLoop<'a, M, P, S>
where
    M: StepperDriver,
    P: PumpDriver,
    S: RecoveryStore,
{
    /// Build the loop for `config`
    ///
    /// `motors` are taken in axis order. The pump is dropped when the node
    /// has no pump calibration.
    pub fn new<I>(
        config: &NodeConfig,
        motors: I,
        pump: P,
        store: S,
        cell: &'a OrderCell,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = M>,
    {
        config.validate()?;

        let interval = config.timing.persist_interval_ms;
        let mut motors = motors.into_iter();
        let mut axes = Vec::new();
        for (i, axis) in config.axes.iter().enumerate() {
            let motor = motors.next().ok_or(ConfigError::MissingMotor(i as u8))?;
            let _ = axes.push(Axis::from_config(motor, axis, interval));
        }

        let mut modules = Vec::new();
        for module in config.modules.iter() {
            let runner = match Choreography::for_module(&module.kind) {
                Some(choreography) => Runner::Motion(Sequencer::new(choreography)),
                None => Runner::Pump,
            };
            let _ = modules.push(Module {
                offset: module.offset,
                runner,
                active: false,
            });
        }

        let pump = config
            .pump
            .clone()
            .map(|calibration| DispenseActuator::new(pump, calibration));

        Ok(Self {
            cell,
            config: config.clone(),
            axes,
            modules,
            pump,
            store,
            state: NodeState::new(),
            pass_started_ms: 0,
            settle_started_ms: 0,
        })
    }

    /// Runtime state
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Node configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Configured axes
    pub fn axes(&self) -> &[Axis<M>] {
        &self.axes
    }

    /// Pump actuator, if the node has one
    pub fn pump_mut(&mut self) -> Option<&mut DispenseActuator<P>> {
        self.pump.as_mut()
    }

    /// Recovery store
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Completed choreography cycles of module `index`
    pub fn module_cycles(&self, index: usize) -> Option<u32> {
        match self.modules.get(index)?.runner {
            Runner::Motion(ref seq) => Some(seq.cycles()),
            Runner::Pump => None,
        }
    }

    /// Replay recovery records and purge the pump line (blocking)
    ///
    /// Leaves the loop in [`Phase::Waiting`], or in a fault phase when the
    /// store or a driver fails. Does nothing outside [`Phase::Boot`].
    pub fn boot<D: DelayNs>(&mut self, delay: &mut D) -> Events {
        let mut events = Events::new();
        if self.state.phase != Phase::Boot {
            return events;
        }

        let mut failure: Option<ErrorKind> = None;
        {
            let mut replayer = Replayer::new(&mut self.store, &mut *delay);
            for (i, (axis, config)) in self.axes.iter_mut().zip(self.config.axes.iter()).enumerate() {
                match replayer.replay(config, axis.driver.motor_mut()) {
                    Ok(outcome) => push(
                        &mut events,
                        StationEvent::Replayed {
                            axis: i as u8,
                            outcome,
                        },
                    ),
                    Err(e) => {
                        failure = Some(e.into());
                        break;
                    }
                }
            }
        }

        if failure.is_none() {
            if let Some(pump) = self.pump.as_mut() {
                match pump.boot_purge(delay) {
                    Ok(true) => push(&mut events, StationEvent::BootPurge),
                    Ok(false) => {}
                    Err(_) => failure = Some(ErrorKind::PumpFault),
                }
            }
        }

        match failure {
            Some(kind) => self.fault(kind, &mut events),
            None => {
                self.state.phase = self.state.phase.transition(Event::BootComplete);
                push(&mut events, StationEvent::Booted);
            }
        }
        events
    }

    /// Advance the loop to `now_ms`
    ///
    /// Passes start at most once per `pass_period_ms`, so nodes that adopt
    /// the same order at the same time keep equal pass counters whether
    /// their passes are busy or empty.
    pub fn poll(&mut self, now_ms: u32) -> Events {
        let mut events = Events::new();
        let phase = self.state.phase;
        if phase.is_fault() {
            return events;
        }

        if phase.accepts_order() && self.adopt_order(&mut events) {
            self.start_pass(now_ms, &mut events);
        } else if phase == Phase::Settling && self.next_pass_due(now_ms) {
            self.state.phase = phase.transition(Event::SettleElapsed);
            self.start_pass(now_ms, &mut events);
        } else if phase.motion_allowed() {
            self.poll_modules(now_ms, &mut events);
        } else if phase == Phase::Cleaning {
            self.poll_cleaning(now_ms, &mut events);
        }
        events
    }

    /// Settle delay and pass period have both run out
    fn next_pass_due(&self, now_ms: u32) -> bool {
        let timing = &self.config.timing;
        now_ms.wrapping_sub(self.settle_started_ms) >= timing.settle_ms
            && now_ms.wrapping_sub(self.pass_started_ms) >= timing.pass_period_ms
    }

    /// Take a newly published order, if any
    fn adopt_order(&mut self, events: &mut Events) -> bool {
        let published = self.cell.snapshot();
        if published.generation == self.state.generation {
            return false;
        }
        self.state.generation = published.generation;

        if !published.order.is_received() {
            push(
                events,
                StationEvent::OrderIgnored {
                    generation: published.generation,
                },
            );
            return false;
        }

        self.state.order = published.order;
        self.state.order_start = self.state.iteration;
        self.state.phase = self.state.phase.transition(Event::OrderAccepted);
        push(
            events,
            StationEvent::OrderAccepted {
                generation: published.generation,
                order: published.order,
            },
        );
        true
    }

    fn start_pass(&mut self, now_ms: u32, events: &mut Events) {
        let pass = self.state.pass();
        let order = self.state.order;
        let units = order.units();
        self.pass_started_ms = now_ms;

        let mut active = 0u8;
        let mut exhausted = true;
        let mut failure = None;

        for module in self.modules.iter_mut() {
            let window = module.window(units);
            if !window.is_exhausted(pass) {
                exhausted = false;
            }
            let Some(unit) = window.unit(pass) else {
                continue;
            };

            match module.runner {
                Runner::Motion(ref mut seq) => {
                    seq.start();
                    module.active = true;
                }
                Runner::Pump => {
                    let Some(pump) = self.pump.as_mut() else {
                        continue;
                    };
                    match pump.plan(order.item, unit, units) {
                        Ok(Some(stroke)) => match pump.start(stroke, now_ms) {
                            Ok(()) => {
                                module.active = true;
                                push(events, StationEvent::StrokeStarted(stroke));
                            }
                            Err(_) => {
                                failure = Some(ErrorKind::PumpFault);
                                break;
                            }
                        },
                        Ok(None) => {}
                        Err(DispenseError::UnknownItem(item)) => {
                            push(events, StationEvent::UnknownItem(item));
                        }
                        Err(DispenseError::Pump(_)) => {
                            failure = Some(ErrorKind::PumpFault);
                            break;
                        }
                    }
                }
            }
            if module.active {
                active += 1;
            }
        }

        if let Some(kind) = failure {
            self.fault(kind, events);
            return;
        }
        if exhausted {
            self.finish_order(now_ms, events);
            return;
        }

        push(events, StationEvent::PassStarted { pass, active });
        // Nothing to wait for; the pass period still holds the next pass back
        if active == 0 {
            self.end_pass(now_ms, events);
        }
    }

    fn poll_modules(&mut self, now_ms: u32, events: &mut Events) {
        let mut any_active = false;
        let mut failure = None;

        for (i, module) in self.modules.iter_mut().enumerate() {
            if !module.active {
                continue;
            }
            match module.runner {
                Runner::Motion(ref mut seq) => {
                    match seq.poll(&mut self.axes, &mut self.store, now_ms) {
                        Ok(SequencerState::Idle) => {
                            module.active = false;
                            push(events, StationEvent::ChoreographyComplete { module: i as u8 });
                        }
                        Ok(_) => {}
                        Err(e) => {
                            failure = Some(ErrorKind::from(e));
                            break;
                        }
                    }
                }
                Runner::Pump => match self.pump.as_mut().map(|p| p.poll(now_ms)) {
                    Some(Ok(Some(stroke))) => {
                        module.active = false;
                        push(events, StationEvent::StrokeComplete(stroke));
                    }
                    Some(Ok(None)) => {}
                    Some(Err(_)) => {
                        failure = Some(ErrorKind::PumpFault);
                        break;
                    }
                    None => module.active = false,
                },
            }
            any_active |= module.active;
        }

        if let Some(kind) = failure {
            self.fault(kind, events);
        } else if !any_active {
            self.end_pass(now_ms, events);
        }
    }

    fn poll_cleaning(&mut self, now_ms: u32, events: &mut Events) {
        let finished = match self.pump.as_mut() {
            Some(pump) => match pump.poll(now_ms) {
                Ok(done) => done.is_some(),
                Err(_) => {
                    self.fault(ErrorKind::PumpFault, events);
                    return;
                }
            },
            None => true,
        };
        if finished {
            self.state.phase = self.state.phase.transition(Event::CleaningFinished);
            push(events, StationEvent::CleaningComplete);
            push(events, StationEvent::OrderComplete);
        }
    }

    fn end_pass(&mut self, now_ms: u32, events: &mut Events) {
        push(
            events,
            StationEvent::PassComplete {
                pass: self.state.pass(),
            },
        );
        self.state.iteration = self.state.iteration.wrapping_add(1);
        self.settle_started_ms = now_ms;
        self.state.phase = self.state.phase.transition(Event::PassFinished);
    }

    fn finish_order(&mut self, now_ms: u32, events: &mut Events) {
        if self.state.order.wants_cleaning() {
            if let Some(pump) = self.pump.as_mut() {
                let stroke = pump.clean_stroke();
                if pump.start(stroke, now_ms).is_err() {
                    self.fault(ErrorKind::PumpFault, events);
                    return;
                }
                self.state.phase = self.state.phase.transition(Event::CleaningRequested);
                push(events, StationEvent::CleaningStarted);
                return;
            }
        }
        self.state.phase = self.state.phase.transition(Event::OrderFinished);
        push(events, StationEvent::OrderComplete);
    }

    /// Stop every output and latch the fault
    fn fault(&mut self, kind: ErrorKind, events: &mut Events) {
        for axis in self.axes.iter_mut() {
            axis.driver.stop();
            let _ = axis.driver.enable(false);
        }
        for module in self.modules.iter_mut() {
            if let Runner::Motion(ref mut seq) = module.runner {
                seq.abort();
            }
            module.active = false;
        }
        if let Some(pump) = self.pump.as_mut() {
            let _ = pump.stop();
        }
        self.state.phase = self.state.phase.transition(Event::ErrorDetected(kind));
        push(events, StationEvent::Fault(kind));
    }
}
