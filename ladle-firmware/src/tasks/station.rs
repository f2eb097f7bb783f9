//! Station loop task
//!
//! Polls the station loop every millisecond and logs what it did.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use ladle_core::recovery::ReplayOutcome;
use ladle_core::station::StationEvent;

use crate::board::Station;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1;

#[embassy_executor::task]
pub async fn station_task(station: &'static mut Station) {
    info!("Station task started in phase {}", station.phase());

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let start = Instant::now();

    loop {
        ticker.next().await;

        let now_ms = start.elapsed().as_millis() as u32;
        log_events(&station.poll(now_ms));
    }
}

/// Log station events at a level matching their weight
pub fn log_events(events: &[StationEvent]) {
    for event in events {
        match event {
            StationEvent::Fault(kind) => error!("Fault: {}, node halted", kind),
            StationEvent::UnknownItem(item) => warn!("No pump duty for item {}, skipping", item),
            StationEvent::OrderIgnored { generation } => {
                warn!("Order {} carries no quantity, ignored", generation)
            }
            StationEvent::Replayed {
                axis,
                outcome: ReplayOutcome::Corrupt(raw),
            } => warn!("Axis {} recovery record corrupt ({=u16:#x}), skipped", axis, raw),
            StationEvent::StrokeStarted(_)
            | StationEvent::StrokeComplete(_)
            | StationEvent::ChoreographyComplete { .. } => debug!("{}", event),
            _ => info!("{}", event),
        }
    }
}
