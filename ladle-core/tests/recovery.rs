//! Power-loss recovery across a simulated restart

mod common;

use common::{run_until, steppers, NoDelay, RecordingPump, RecordingStepper};
use ladle_core::bus::OrderCell;
use ladle_core::config::NodeConfig;
use ladle_core::motion::AxisDriver;
use ladle_core::recovery::{RecoveryRecord, ReplayOutcome, Replayer};
use ladle_core::station::{StationEvent, StationLoop};
use ladle_core::traits::Direction;
use ladle_hal::RamEeprom;
use ladle_protocol::Order;
use proptest::prelude::*;

#[test]
fn test_interrupted_move_is_replayed_once() {
    let config = NodeConfig::containers_node();
    let mut store = RamEeprom::<32>::new();

    // First power cycle: cut power 700 ms into the C-fork's outbound leg
    {
        let cell = OrderCell::new();
        let mut station = StationLoop::new(
            &config,
            steppers(2),
            RecordingPump::default(),
            &mut store,
            &cell,
        )
        .unwrap();
        station.boot(&mut NoDelay);
        cell.publish(Order::new(1, 1, false, false));
        for t in 1..=700 {
            station.poll(t);
        }
        assert!(station.axes()[1].driver.remaining() > 0);
    }

    let c_fork = &config.axes[1];
    let logged = RecoveryRecord::read(&mut store, &c_fork.slot)
        .unwrap()
        .unwrap();
    assert_eq!(logged.direction, 1);
    assert!((600..=700).contains(&logged.elapsed_ms));

    // Second power cycle: the C-fork is driven forward for the logged time
    let cell = OrderCell::new();
    let mut station = StationLoop::new(
        &config,
        steppers(2),
        RecordingPump::default(),
        &mut store,
        &cell,
    )
    .unwrap();
    let events = station.boot(&mut NoDelay);
    let expected_steps = 200 * logged.elapsed_ms as u32 / 1000;
    assert!(events.contains(&StationEvent::Replayed {
        axis: 1,
        outcome: ReplayOutcome::Replayed {
            direction: Direction::Forward,
            elapsed_ms: logged.elapsed_ms,
            steps: expected_steps,
        },
    }));
    assert!(events.contains(&StationEvent::Replayed {
        axis: 0,
        outcome: ReplayOutcome::Unwritten,
    }));
    assert_eq!(station.axes()[1].driver.motor().forward, expected_steps);
    drop(station);

    // Third power cycle: nothing left to replay
    let mut replayer = Replayer::new(&mut store, NoDelay);
    let mut motor = RecordingStepper::default();
    assert_eq!(
        replayer.replay(c_fork, &mut motor),
        Ok(ReplayOutcome::Idle)
    );
    assert_eq!(motor.forward + motor.backward, 0);
}

#[test]
fn test_zero_elapsed_replay_is_noop() {
    let config = NodeConfig::lids_node();
    let stamp = &config.axes[2];
    let mut store = RamEeprom::<32>::new();
    for direction in [None, Some(Direction::Forward), Some(Direction::Backward)] {
        RecoveryRecord::new(direction, 0)
            .write(&mut store, &stamp.slot)
            .unwrap();
        let writes = store.write_count();

        let mut replayer = Replayer::new(&mut store, NoDelay);
        let mut motor = RecordingStepper::default();
        assert_eq!(replayer.replay(stamp, &mut motor), Ok(ReplayOutcome::Idle));
        assert_eq!(motor.forward + motor.backward, 0);
        assert!(!motor.enabled);
        drop(replayer);
        assert_eq!(store.write_count(), writes);
    }
}

#[test]
fn test_completed_order_leaves_nothing_to_replay() {
    let config = NodeConfig::lids_node();
    let mut store = RamEeprom::<32>::new();
    {
        let cell = OrderCell::new();
        let mut station = StationLoop::new(
            &config,
            steppers(3),
            ladle_core::traits::NoPump,
            &mut store,
            &cell,
        )
        .unwrap();
        station.boot(&mut NoDelay);
        cell.publish(Order::new(1, 1, false, false));
        run_until(&mut station, 1, 60_000, |e| *e == StationEvent::OrderComplete);
    }

    for axis in config.axes.iter() {
        let record = RecoveryRecord::read(&mut store, &axis.slot).unwrap();
        assert!(record.map_or(true, |r| !r.is_pending()));
    }
}

proptest! {
    #[test]
    fn prop_record_roundtrip(d in -1i8..=1, t in 0u16..0xFFFF, base in 0u16..28) {
        let mut store = RamEeprom::<64>::new();
        let slot = ladle_core::config::RecoverySlot::new(base, base + 32);
        let record = RecoveryRecord { direction: d, elapsed_ms: t };
        record.write(&mut store, &slot).unwrap();
        prop_assert_eq!(RecoveryRecord::read(&mut store, &slot), Ok(Some(record)));
    }

    #[test]
    fn prop_motion_terminates(
        start in -1_000i32..1_000,
        distance in 1i32..2_000,
        backward: bool,
        max_speed in 10u32..1_000,
        acceleration in 1u32..5_000,
    ) {
        let target = if backward { start - distance } else { start + distance };
        let mut driver = AxisDriver::new(RecordingStepper::default(), start, max_speed, acceleration);
        driver.move_to(target);

        // Never slower than 10 steps/s: at most 100 ms per step
        let bound = distance as u32 * 100 + 2;
        let mut finished = false;
        for t in 0..bound {
            if driver.tick(t).unwrap() == 0 {
                finished = true;
                break;
            }
        }
        prop_assert!(finished);
        prop_assert_eq!(driver.position(), target);
        prop_assert_eq!(driver.remaining(), 0);
    }
}
