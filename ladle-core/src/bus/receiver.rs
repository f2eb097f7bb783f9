//! Inbound order messages

use ladle_hal::I2cTarget;
use ladle_protocol::{MessageError, Order, ORDER_MESSAGE_LEN};

use super::cell::OrderCell;

/// Decodes bus payloads and publishes valid orders
///
/// Malformed payloads are dropped; the previous order stays in force.
pub struct BusReceiver<'a> {
    cell: &'a OrderCell,
    accepted: u32,
    rejected: u32,
}

impl<'a> BusReceiver<'a> {
    /// Create a receiver publishing into `cell`
    pub fn new(cell: &'a OrderCell) -> Self {
        Self {
            cell,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Messages published so far
    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    /// Messages dropped so far
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Handle one received payload
    pub fn on_message(&mut self, payload: &[u8]) -> Result<Order, MessageError> {
        match Order::decode(payload) {
            Ok(order) => {
                self.cell.publish(order);
                self.accepted = self.accepted.wrapping_add(1);
                Ok(order)
            }
            Err(e) => {
                self.rejected = self.rejected.wrapping_add(1);
                Err(e)
            }
        }
    }

    /// Wait for the next controller write and handle it
    ///
    /// The outer error is the bus error; the inner result is the decode.
    pub async fn receive<T: I2cTarget>(
        &mut self,
        target: &mut T,
    ) -> Result<Result<Order, MessageError>, T::Error> {
        let mut buf = [0u8; ORDER_MESSAGE_LEN];
        let len = target.receive(&mut buf).await?;
        if len > buf.len() {
            self.rejected = self.rejected.wrapping_add(1);
            return Ok(Err(MessageError::TooLong(len)));
        }
        Ok(self.on_message(&buf[..len]))
    }
}
