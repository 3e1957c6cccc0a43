//! Device identification reply

use std::fmt;

use crate::error::{Error, Result};

/// Serial number reported by the get-device-id command
///
/// # Payload Layout
///
/// ```text
/// ┌─────────────┬──────────────────────┐
/// │ Subcommand  │   Serial (ASCII)     │
/// │   0x50      │      4 bytes         │
/// └─────────────┴──────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Serial number, exactly four ASCII bytes
    pub serial: [u8; 4],
}

impl DeviceIdentity {
    /// Reply subcommand byte
    pub const SUBCOMMAND: u8 = 0x50;

    /// Serial length in bytes
    pub const SERIAL_LEN: usize = 4;

    /// Encoded payload length
    pub const PAYLOAD_LEN: usize = 1 + Self::SERIAL_LEN;

    /// Serial reported by a factory-default device
    pub const DEFAULT_SERIAL: [u8; 4] = *b"1234";

    /// Create an identity from a serial string
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] unless `serial` is exactly four ASCII bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use mkscales_types::DeviceIdentity;
    ///
    /// let id = DeviceIdentity::new("1234").unwrap();
    /// assert_eq!(id.serial_str(), "1234");
    /// assert!(DeviceIdentity::new("12345").is_err());
    /// ```
    pub fn new(serial: &str) -> Result<Self> {
        if !serial.is_ascii() {
            return Err(Error::Validation(format!(
                "serial must be ASCII, got {:?}",
                serial
            )));
        }

        let serial: [u8; 4] = serial.as_bytes().try_into().map_err(|_| {
            Error::Validation(format!(
                "serial must be {} bytes, got {}",
                Self::SERIAL_LEN,
                serial.len()
            ))
        })?;

        Ok(Self { serial })
    }

    /// Serial as text
    pub fn serial_str(&self) -> &str {
        // Constructors only admit ASCII
        std::str::from_utf8(&self.serial).unwrap_or("????")
    }

    /// Encode as a reply payload
    pub fn to_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::PAYLOAD_LEN);
        buf.push(Self::SUBCOMMAND);
        buf.extend_from_slice(&self.serial);
        buf
    }

    /// Decode a reply payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on a wrong length, a wrong subcommand byte,
    /// or a non-ASCII serial.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() != Self::PAYLOAD_LEN {
            return Err(Error::Parse(format!(
                "device id payload must be {} bytes, got {}",
                Self::PAYLOAD_LEN,
                payload.len()
            )));
        }

        if payload[0] != Self::SUBCOMMAND {
            return Err(Error::Parse(format!(
                "unexpected subcommand 0x{:02X}, expected 0x{:02X}",
                payload[0],
                Self::SUBCOMMAND
            )));
        }

        let mut serial = [0u8; 4];
        serial.copy_from_slice(&payload[1..]);

        if !serial.is_ascii() {
            return Err(Error::Parse(format!("non-ASCII serial: {:02X?}", serial)));
        }

        Ok(Self { serial })
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            serial: Self::DEFAULT_SERIAL,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device[SN: {}]", self.serial_str())
    }
}
