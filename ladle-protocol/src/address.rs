//! Node addressing and the head unit's broadcast

use ladle_hal::I2cBus;

use crate::order::Order;

/// I2C addresses of the station nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NodeAddress {
    /// Containers module and sauce pump
    Containers = 1,
    /// Lids module and stamp
    Lids = 2,
}

impl NodeAddress {
    /// Every node on the line, in conveyor order
    pub const ALL: [NodeAddress; 2] = [NodeAddress::Containers, NodeAddress::Lids];

    /// Get the 7-bit bus address
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Look up a node by bus address
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeAddress::Containers),
            2 => Some(NodeAddress::Lids),
            _ => None,
        }
    }
}

/// Write an order to every node on the line
///
/// Nodes are written in conveyor order. The first bus error aborts the
/// broadcast; there are no retries.
pub fn broadcast<B: I2cBus>(bus: &mut B, order: &Order) -> Result<(), B::Error> {
    let payload = order.encode();
    for node in NodeAddress::ALL {
        bus.write(node.as_u8(), &payload)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::ORDER_MESSAGE_LEN;

    struct RecordingBus {
        writes: [(u8, [u8; ORDER_MESSAGE_LEN]); 4],
        count: usize,
        fail_at: Option<u8>,
    }

    impl RecordingBus {
        fn new() -> Self {
            Self {
                writes: [(0, [0; ORDER_MESSAGE_LEN]); 4],
                count: 0,
                fail_at: None,
            }
        }
    }

    impl I2cBus for RecordingBus {
        type Error = ();

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), ()> {
            if self.fail_at == Some(address) {
                return Err(());
            }
            let mut payload = [0; ORDER_MESSAGE_LEN];
            payload.copy_from_slice(data);
            self.writes[self.count] = (address, payload);
            self.count += 1;
            Ok(())
        }
    }

    #[test]
    fn test_broadcast_reaches_every_node() {
        let mut bus = RecordingBus::new();
        let order = Order::new(2, 3, false, true);
        broadcast(&mut bus, &order).unwrap();

        assert_eq!(bus.count, 2);
        assert_eq!(bus.writes[0].0, 1);
        assert_eq!(bus.writes[1].0, 2);
        assert_eq!(Order::decode(&bus.writes[1].1), Ok(order));
    }

    #[test]
    fn test_broadcast_stops_on_error() {
        let mut bus = RecordingBus::new();
        bus.fail_at = Some(1);
        assert!(broadcast(&mut bus, &Order::new(1, 1, false, false)).is_err());
        assert_eq!(bus.count, 0);
    }

    #[test]
    fn test_address_lookup() {
        assert_eq!(NodeAddress::from_u8(2), Some(NodeAddress::Lids));
        assert_eq!(NodeAddress::from_u8(9), None);
    }
}
