//! Whole-order scenarios on a single node

mod common;

use common::{run_until, steppers, NoDelay, RecordingPump};
use ladle_core::bus::OrderCell;
use ladle_core::config::NodeConfig;
use ladle_core::dispense::Stroke;
use ladle_core::state::Phase;
use ladle_core::station::{ActivationWindow, StationEvent, StationLoop};
use ladle_core::traits::{NoPump, PumpDirection};
use ladle_hal::RamEeprom;
use ladle_protocol::Order;

fn is_complete(e: &StationEvent) -> bool {
    *e == StationEvent::OrderComplete
}

#[test]
fn test_two_units_item_three() {
    let cell = OrderCell::new();
    let config = NodeConfig::containers_node();
    let mut station = StationLoop::new(
        &config,
        steppers(2),
        RecordingPump::default(),
        RamEeprom::<32>::new(),
        &cell,
    )
    .unwrap();
    station.boot(&mut NoDelay);
    let boot_runs = station.pump_mut().unwrap().pump_mut().runs.len();

    cell.publish(Order::new(2, 3, false, false));
    let (events, _) = run_until(&mut station, 1, 60_000, is_complete);

    assert_eq!(station.module_cycles(0), Some(2));
    let runs = &station.pump_mut().unwrap().pump_mut().runs[boot_runs..];
    assert_eq!(
        runs,
        [
            (PumpDirection::Dispense, 200),
            (PumpDirection::Dispense, 200),
            (PumpDirection::Reverse, 200),
        ]
    );

    let strokes: Vec<Stroke> = events
        .iter()
        .filter_map(|e| match e {
            StationEvent::StrokeComplete(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        strokes,
        [
            Stroke::Dispense { duty: 200 },
            Stroke::Dispense { duty: 200 },
            Stroke::Purge { duty: 200 },
        ]
    );
    assert!(!events.contains(&StationEvent::CleaningStarted));
    assert_eq!(station.phase(), Phase::Complete);

    // Forks are back home
    let axes = station.axes();
    assert_eq!(axes[0].driver.position(), 200);
    assert_eq!(axes[1].driver.position(), 0);
    assert_eq!(axes[0].driver.motor().forward + axes[0].driver.motor().backward, 800);
}

#[test]
fn test_zero_quantity_soap_clean() {
    let cell = OrderCell::new();
    let config = NodeConfig::containers_node();
    let mut station = StationLoop::new(
        &config,
        steppers(2),
        RecordingPump::default(),
        RamEeprom::<32>::new(),
        &cell,
    )
    .unwrap();
    station.boot(&mut NoDelay);
    let boot_runs = station.pump_mut().unwrap().pump_mut().runs.len();

    cell.publish(Order::new(0, 1, true, false));
    let events = station.poll(1);
    assert!(events.contains(&StationEvent::CleaningStarted));
    assert_eq!(station.phase(), Phase::Cleaning);

    let (events, t) = run_until(&mut station, 2, 40_000, is_complete);
    assert_eq!(t, 1 + 30_000);
    assert!(events.contains(&StationEvent::CleaningComplete));

    assert_eq!(station.module_cycles(0), Some(0));
    let runs = &station.pump_mut().unwrap().pump_mut().runs[boot_runs..];
    assert_eq!(runs, [(PumpDirection::Dispense, 255)]);
    assert_eq!(station.phase(), Phase::Complete);
}

#[test]
fn test_windows_for_quantity_three() {
    let windows = [0, 1, 2].map(|offset| ActivationWindow::new(offset, 3));
    let active = |pass| -> Vec<usize> {
        windows
            .iter()
            .enumerate()
            .filter(|(_, w)| w.contains(pass))
            .map(|(i, _)| i + 1)
            .collect()
    };

    assert_eq!(active(0), [1]);
    assert_eq!(active(1), [1, 2]);
    assert_eq!(active(2), [1, 2, 3]);
    assert_eq!(active(3), [2, 3]);
    assert_eq!(active(4), [3]);
    assert!(active(5).is_empty());
}

#[test]
fn test_pipelined_passes() {
    let cell = OrderCell::new();
    let config = NodeConfig::containers_node();
    let mut station = StationLoop::new(
        &config,
        steppers(2),
        RecordingPump::default(),
        RamEeprom::<32>::new(),
        &cell,
    )
    .unwrap();
    station.boot(&mut NoDelay);

    cell.publish(Order::new(3, 1, false, false));
    let (events, _) = run_until(&mut station, 1, 120_000, is_complete);

    let passes: Vec<(u32, u8)> = events
        .iter()
        .filter_map(|e| match e {
            StationEvent::PassStarted { pass, active } => Some((*pass, *active)),
            _ => None,
        })
        .collect();
    // Forks at passes 0-2, pump at 1-3 plus the purge at 4
    assert_eq!(passes, [(0, 1), (1, 2), (2, 2), (3, 1), (4, 1)]);
    assert_eq!(station.module_cycles(0), Some(3));
}

#[test]
fn test_unknown_item_skips_pump() {
    let cell = OrderCell::new();
    let config = NodeConfig::containers_node();
    let mut station = StationLoop::new(
        &config,
        steppers(2),
        RecordingPump::default(),
        RamEeprom::<32>::new(),
        &cell,
    )
    .unwrap();
    station.boot(&mut NoDelay);
    let boot_runs = station.pump_mut().unwrap().pump_mut().runs.len();

    cell.publish(Order::new(1, 7, false, false));
    let (events, _) = run_until(&mut station, 1, 60_000, is_complete);

    assert!(events.contains(&StationEvent::UnknownItem(7)));
    assert_eq!(station.module_cycles(0), Some(1));
    assert_eq!(station.pump_mut().unwrap().pump_mut().runs.len(), boot_runs);
}

#[test]
fn test_next_order_after_complete() {
    let cell = OrderCell::new();
    let config = NodeConfig::lids_node();
    let mut station =
        StationLoop::new(&config, steppers(3), NoPump, RamEeprom::<32>::new(), &cell).unwrap();
    station.boot(&mut NoDelay);

    cell.publish(Order::new(1, 1, true, true));
    let (_, t) = run_until(&mut station, 1, 60_000, is_complete);
    // No pump on this node: cleaning flags complete the order directly
    assert_eq!(station.phase(), Phase::Complete);
    assert_eq!(station.module_cycles(0), Some(1));
    assert_eq!(station.module_cycles(1), Some(1));
    let first_end = station.state().iteration;

    cell.publish(Order::new(1, 2, false, false));
    let events = station.poll(t + 1);
    assert!(matches!(
        events[0],
        StationEvent::OrderAccepted { generation: 2, .. }
    ));
    assert_eq!(station.state().order_start, first_end);
    assert_eq!(station.state().pass(), 1);
}
