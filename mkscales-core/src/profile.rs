//! Values reported by the emulated device

use mkscales_types::{DeviceIdentity, DivisionCode, WeightReading};

use crate::error::Result;

/// Emulated device profile
///
/// Fixed at startup; command handlers report these values regardless of
/// request contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceProfile {
    reading: WeightReading,
    identity: DeviceIdentity,
}

impl DeviceProfile {
    /// Create a profile
    ///
    /// # Errors
    ///
    /// Fails unless `serial` is exactly four ASCII bytes.
    pub fn new(weight: u32, division: DivisionCode, serial: &str) -> Result<Self> {
        Ok(Self {
            reading: WeightReading::new(weight, division),
            identity: DeviceIdentity::new(serial)?,
        })
    }

    pub fn weight_reading(&self) -> WeightReading {
        self.reading
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }
}
