//! Order bus receive side
//!
//! Wraps the RP2040 I2C block in target mode. The head unit only ever
//! writes to a node; reads are answered with nothing.

use embassy_rp::i2c::Instance;
use embassy_rp::i2c_slave::{Command, Error, I2cSlave};
use ladle_hal::I2cTarget;

/// Receive errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusTargetError {
    /// Controller aborted the transfer
    Abort,
    /// Answering a read failed
    Respond,
}

/// I2C target listening on this node's address
pub struct BusTarget<'d, T: Instance> {
    i2c: I2cSlave<'d, T>,
}

impl<'d, T: Instance> BusTarget<'d, T> {
    /// Wrap an already configured I2C target
    pub fn new(i2c: I2cSlave<'d, T>) -> Self {
        Self { i2c }
    }
}

impl<T: Instance> I2cTarget for BusTarget<'_, T> {
    type Error = BusTargetError;

    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, BusTargetError> {
        loop {
            match self.i2c.listen(buf).await {
                Ok(Command::Write(len)) | Ok(Command::GeneralCall(len)) => return Ok(len),
                // Oversized write: report one byte past the buffer so the
                // caller rejects it
                Err(Error::PartialWrite(_)) | Err(Error::PartialGeneralCall(_)) => {
                    return Ok(buf.len() + 1)
                }
                Ok(Command::Read) | Ok(Command::WriteRead(_)) => {
                    self.i2c
                        .respond_and_fill(&[], 0x00)
                        .await
                        .map_err(|_| BusTargetError::Respond)?;
                }
                Err(_) => return Err(BusTargetError::Abort),
            }
        }
    }
}
