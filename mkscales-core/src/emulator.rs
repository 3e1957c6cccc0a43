//! Request processing for the emulated device
//!
//! An emulator combines the frame codec with the command table:
//! parse the request frame, dispatch on the body's first byte, wrap the
//! handler's payload into a response frame.

use bytes::BytesMut;
use tracing::debug;

use crate::{
    command::{CommandRegistry, Opcode},
    error::{Error, Result},
    frame::FrameCodec,
    profile::DeviceProfile,
};

/// Emulated MK scales device
///
/// Immutable once built. Share one instance across all connections
/// (`Arc<Emulator>`); processing takes `&self` and needs no locking.
///
/// # Examples
///
/// ```
/// use mkscales_core::Emulator;
///
/// let emulator = Emulator::default();
/// let request = emulator.codec().encode_request(&[0x90]).unwrap();
/// let response = emulator.process(&request).unwrap();
///
/// assert_eq!(&response[4..9], b"\x501234");
/// ```
#[derive(Debug, Clone)]
pub struct Emulator {
    codec: FrameCodec,
    registry: CommandRegistry,
}

impl Emulator {
    pub fn new(codec: FrameCodec, registry: CommandRegistry) -> Self {
        Self { codec, registry }
    }

    /// Emulator with the standard command set reporting `profile`
    pub fn with_profile(codec: FrameCodec, profile: &DeviceProfile) -> Self {
        Self::new(codec, CommandRegistry::mk_scales(profile))
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Turn one raw request into one raw response
    ///
    /// # Errors
    ///
    /// Any frame error from [`FrameCodec::parse`], [`Error::EmptyBody`] when
    /// the body has no opcode, [`Error::UnknownOpcode`] from dispatch, or
    /// [`Error::PayloadTooLarge`] if a handler's payload does not fit the
    /// response length field.
    pub fn process(&self, raw: &[u8]) -> Result<BytesMut> {
        let body = self.codec.parse(raw)?;
        let opcode = *body.first().ok_or(Error::EmptyBody)?;

        match Opcode::try_from(opcode) {
            Ok(known) => debug!(opcode = %known, "Processing request"),
            Err(_) => debug!(opcode = %format!("0x{:02X}", opcode), "Processing request"),
        }

        let payload = self.registry.dispatch(opcode)?;
        self.codec.build(&payload)
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(FrameCodec::default(), CommandRegistry::default())
    }
}
