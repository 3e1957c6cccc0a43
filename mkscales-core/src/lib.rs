//! # mkscales-core
//!
//! Core protocol implementation for MK scales devices.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - Checksum calculation
//! - Command dispatch
//! - Protocol constants

pub mod checksum;
pub mod command;
pub mod constants;
pub mod emulator;
pub mod error;
pub mod frame;
pub mod profile;

pub use checksum::Checksum;
pub use command::{CommandHandler, CommandRegistry, Opcode};
pub use emulator::Emulator;
pub use error::{Error, Result};
pub use frame::{FrameCodec, LengthWidth};
pub use profile::DeviceProfile;

/// Default emulator port
pub const DEFAULT_PORT: u16 = 8000;
