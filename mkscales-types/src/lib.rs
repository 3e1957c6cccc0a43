//! Reply payload types for mkscales

pub mod device_info;
pub mod error;
pub mod weight;

pub use device_info::DeviceIdentity;
pub use error::{Error, Result};
pub use weight::{DivisionCode, WeightReading};
