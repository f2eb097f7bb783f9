//! Order bus receive task
//!
//! Waits for head-unit writes on the I2C target and publishes each valid
//! order into the shared cell. Malformed payloads are logged and dropped.

use defmt::*;
use ladle_core::bus::{BusReceiver, OrderCell};

use crate::board::Target;

#[embassy_executor::task]
pub async fn bus_rx_task(mut target: Target, cell: &'static OrderCell) {
    info!("Bus receive task started");

    let mut receiver = BusReceiver::new(cell);

    loop {
        match receiver.receive(&mut target).await {
            Ok(Ok(order)) => {
                debug!(
                    "Order {} received: quantity={} item={} soap={} rinse={}",
                    cell.generation(),
                    order.quantity,
                    order.item.raw(),
                    order.soap_clean,
                    order.rinse_clean
                );
            }
            Ok(Err(e)) => {
                warn!(
                    "Dropped order message: {} ({} dropped so far)",
                    e,
                    receiver.rejected()
                );
            }
            Err(e) => {
                warn!("Bus receive failed: {}", e);
            }
        }
    }
}
