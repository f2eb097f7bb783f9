//! I2C bus abstractions
//!
//! The coordination bus is I2C: the head unit is the controller and writes
//! order payloads to each node, the nodes listen as targets.

/// I2C bus controller
///
/// The head unit side only ever writes to node addresses.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;
}

/// I2C target (peripheral) receive side
///
/// Implementations wait for the controller to address this node and
/// return the number of bytes it wrote into `buf`.
pub trait I2cTarget {
    /// Error type for receive operations
    type Error;

    /// Wait for the next controller write addressed to this node
    ///
    /// Bytes beyond `buf.len()` are dropped by the implementation; the
    /// returned length is the number of bytes actually written by the
    /// controller, so callers can tell an oversized write from a fitting one.
    fn receive(
        &mut self,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;
}
