//! Order message encoding and decoding

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Exact payload length of an order message
pub const ORDER_MESSAGE_LEN: usize = 6;

/// Quantity value meaning "no order received yet"
pub const QUANTITY_NONE: i16 = -1;

/// Errors that can occur while decoding an order message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Fewer bytes than a full message
    TooShort(usize),
    /// More bytes than a full message
    TooLong(usize),
    /// Quantity below the "none" sentinel
    InvalidQuantity(i16),
}

/// Item code selecting the pump duty profile
///
/// Known items are 1-4; other codes travel over the wire unchanged and are
/// refused by the dispense actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemCode(pub i16);

impl ItemCode {
    /// Get the raw wire value
    pub const fn raw(self) -> i16 {
        self.0
    }
}

/// A production order as broadcast by the head unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    /// Number of items to produce (or [`QUANTITY_NONE`])
    pub quantity: i16,
    /// Item code (duty profile selector)
    pub item: ItemCode,
    /// Run a soap clean-in-place cycle after the order
    pub soap_clean: bool,
    /// Run a rinse clean-in-place cycle after the order
    pub rinse_clean: bool,
}

impl Default for Order {
    fn default() -> Self {
        Self::none()
    }
}

impl Order {
    /// Create a production order
    pub const fn new(quantity: i16, item: i16, soap_clean: bool, rinse_clean: bool) -> Self {
        Self {
            quantity,
            item: ItemCode(item),
            soap_clean,
            rinse_clean,
        }
    }

    /// The "nothing received" order a node boots with
    pub const fn none() -> Self {
        Self::new(QUANTITY_NONE, -1, false, false)
    }

    /// Check if this order carries a usable quantity
    pub fn is_received(&self) -> bool {
        self.quantity >= 0
    }

    /// Check if any clean-in-place cycle was requested
    pub fn wants_cleaning(&self) -> bool {
        self.soap_clean || self.rinse_clean
    }

    /// Quantity as an iteration count (0 for the sentinel)
    pub fn units(&self) -> u32 {
        self.quantity.max(0) as u32
    }

    /// Decode an order from a received payload
    ///
    /// The payload must be exactly [`ORDER_MESSAGE_LEN`] bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, MessageError> {
        let bytes: &[u8; ORDER_MESSAGE_LEN] = match payload.len() {
            n if n < ORDER_MESSAGE_LEN => return Err(MessageError::TooShort(n)),
            n if n > ORDER_MESSAGE_LEN => return Err(MessageError::TooLong(n)),
            _ => payload
                .try_into()
                .map_err(|_| MessageError::TooShort(payload.len()))?,
        };

        let quantity = i16::from_le_bytes([bytes[0], bytes[1]]);
        if quantity < QUANTITY_NONE {
            return Err(MessageError::InvalidQuantity(quantity));
        }
        let item = i16::from_le_bytes([bytes[2], bytes[3]]);

        Ok(Self {
            quantity,
            item: ItemCode(item),
            soap_clean: bytes[4] != 0,
            rinse_clean: bytes[5] != 0,
        })
    }

    /// Encode this order into its wire payload
    pub fn encode(&self) -> [u8; ORDER_MESSAGE_LEN] {
        let [q_lo, q_hi] = self.quantity.to_le_bytes();
        let [i_lo, i_hi] = self.item.0.to_le_bytes();
        [
            q_lo,
            q_hi,
            i_lo,
            i_hi,
            self.soap_clean as u8,
            self.rinse_clean as u8,
        ]
    }
}
