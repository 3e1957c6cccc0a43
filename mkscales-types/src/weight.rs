//! Weight reading reply

use std::fmt;

use crate::error::{Error, Result};

/// Decimal division code sent alongside a weight
///
/// The device reports the raw code; its interpretation (decimal point
/// position / display division) is left to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DivisionCode(pub u8);

impl DivisionCode {
    /// Code reported by a factory-default device
    pub const DEFAULT: Self = Self(0x03);
}

impl Default for DivisionCode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for DivisionCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl fmt::Display for DivisionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Reply of the get-weight command
///
/// # Payload Layout
///
/// ```text
/// ┌─────────────┬─────────────┬─────────────┐
/// │ Subcommand  │   Weight    │  Division   │
/// │   0x10      │   4 bytes   │   1 byte    │
/// │             │  (BE u32)   │             │
/// └─────────────┴─────────────┴─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeightReading {
    /// Raw weight value
    pub weight: u32,

    /// Decimal division code
    pub division: DivisionCode,
}

impl WeightReading {
    /// Reply subcommand byte
    pub const SUBCOMMAND: u8 = 0x10;

    /// Encoded payload length
    pub const PAYLOAD_LEN: usize = 6;

    pub fn new(weight: u32, division: DivisionCode) -> Self {
        Self { weight, division }
    }

    /// Encode as a reply payload
    ///
    /// # Examples
    ///
    /// ```
    /// use mkscales_types::WeightReading;
    ///
    /// let payload = WeightReading::default().to_payload();
    /// assert_eq!(payload, [0x10, 0, 0, 0, 0, 0x03]);
    /// ```
    pub fn to_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::PAYLOAD_LEN);
        buf.push(Self::SUBCOMMAND);
        buf.extend_from_slice(&self.weight.to_be_bytes());
        buf.push(self.division.0);
        buf
    }

    /// Decode a reply payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on a wrong length or subcommand byte.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let [subcommand, w0, w1, w2, w3, division] = payload else {
            return Err(Error::Parse(format!(
                "weight payload must be {} bytes, got {}",
                Self::PAYLOAD_LEN,
                payload.len()
            )));
        };

        if *subcommand != Self::SUBCOMMAND {
            return Err(Error::Parse(format!(
                "unexpected subcommand 0x{:02X}, expected 0x{:02X}",
                subcommand,
                Self::SUBCOMMAND
            )));
        }

        Ok(Self {
            weight: u32::from_be_bytes([*w0, *w1, *w2, *w3]),
            division: DivisionCode(*division),
        })
    }
}

impl fmt::Display for WeightReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Weight[{} div={}]", self.weight, self.division)
    }
}
