//! MK scales command definitions and dispatch

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use mkscales_types::{DeviceIdentity, WeightReading};
use tracing::trace;

use crate::{
    constants::opcodes,
    error::{Error, Result},
    profile::DeviceProfile,
};

/// Request opcodes understood by the emulated device
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    GetWeight = opcodes::GET_WEIGHT,
    GetDeviceId = opcodes::GET_DEVICE_ID,
}

impl Opcode {
    /// Get opcode name
    pub fn name(self) -> &'static str {
        match self {
            Self::GetWeight => "GET_WEIGHT",
            Self::GetDeviceId => "GET_DEVICE_ID",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        opcode as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            opcodes::GET_WEIGHT => Ok(Self::GetWeight),
            opcodes::GET_DEVICE_ID => Ok(Self::GetDeviceId),
            _ => Err(Error::UnknownOpcode(value)),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Produces the reply payload of one command
///
/// Handlers take no request data. Closures of type `Fn() -> Bytes` are
/// handlers, so a handler may capture whatever state it reads.
pub trait CommandHandler: Send + Sync {
    fn execute(&self) -> Bytes;
}

impl<F> CommandHandler for F
where
    F: Fn() -> Bytes + Send + Sync,
{
    fn execute(&self) -> Bytes {
        self()
    }
}

/// Read-only opcode → handler table
///
/// Built once with [`CommandRegistry::builder`] and shared by reference
/// across connections.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use mkscales_core::CommandRegistry;
///
/// let registry = CommandRegistry::builder()
///     .register(0x01, || Bytes::from_static(b"\x01\x02"))
///     .build();
///
/// assert_eq!(&registry.dispatch(0x01).unwrap()[..], b"\x01\x02");
/// assert!(registry.dispatch(0x02).is_err());
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: Arc<HashMap<u8, Box<dyn CommandHandler>>>,
}

impl CommandRegistry {
    /// Start building a registry
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    /// Registry of an MK scales device reporting `profile`
    pub fn mk_scales(profile: &DeviceProfile) -> Self {
        let weight = Bytes::from(profile.weight_reading().to_payload());
        let identity = Bytes::from(profile.identity().to_payload());

        Self::builder()
            .register(Opcode::GetWeight.into(), move || weight.clone())
            .register(Opcode::GetDeviceId.into(), move || identity.clone())
            .build()
    }

    /// Run the handler registered for `opcode`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOpcode`] when nothing is registered.
    pub fn dispatch(&self, opcode: u8) -> Result<Bytes> {
        let handler = self
            .handlers
            .get(&opcode)
            .ok_or(Error::UnknownOpcode(opcode))?;

        let payload = handler.execute();

        trace!(
            opcode = format!("0x{:02X}", opcode),
            payload_len = payload.len(),
            "Dispatched command"
        );

        Ok(payload)
    }

    /// Check if a handler is registered
    pub fn contains(&self, opcode: u8) -> bool {
        self.handlers.contains_key(&opcode)
    }

    /// Registered opcodes in ascending order
    pub fn opcodes(&self) -> Vec<u8> {
        let mut opcodes: Vec<u8> = self.handlers.keys().copied().collect();
        opcodes.sort_unstable();
        opcodes
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::mk_scales(&DeviceProfile::default())
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcodes: Vec<String> = self
            .opcodes()
            .into_iter()
            .map(|op| format!("0x{:02X}", op))
            .collect();

        f.debug_struct("CommandRegistry")
            .field("opcodes", &opcodes)
            .finish()
    }
}

/// Builder for [`CommandRegistry`]
#[derive(Default)]
pub struct CommandRegistryBuilder {
    handlers: HashMap<u8, Box<dyn CommandHandler>>,
}

impl CommandRegistryBuilder {
    /// Register a handler, replacing any previous one for the opcode
    pub fn register(mut self, opcode: u8, handler: impl CommandHandler + 'static) -> Self {
        self.handlers.insert(opcode, Box::new(handler));
        self
    }

    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

/// Payload of the get-weight command for a factory-default device
pub fn get_weight() -> Bytes {
    Bytes::from(WeightReading::default().to_payload())
}

/// Payload of the get-device-id command for a factory-default device
pub fn get_device_id() -> Bytes {
    Bytes::from(DeviceIdentity::default().to_payload())
}
