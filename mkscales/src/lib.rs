//! # mkscales
//!
//! Rust implementation of the MK scales communication protocol, with a
//! TCP emulator of the device and a client to talk to it.
//!
//! ## Features
//!
//! - Bit-exact frame codec and checksum
//! - Async/await API using Tokio
//! - Comprehensive error handling
//! - Configurable emulator (CLI + TOML)
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mkscales::{Emulator, Scales, TcpServer};
//!
//! #[tokio::main]
//! async fn main() -> mkscales::Result<()> {
//!     // Start an emulated device
//!     let server = TcpServer::bind("127.0.0.1:8000", Arc::new(Emulator::default())).await?;
//!     tokio::spawn(server.run());
//!
//!     // Query it
//!     let scales = Scales::new("127.0.0.1", 8000);
//!     let id = scales.get_device_id().await?;
//!     println!("{}", id);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod scales;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use scales::Scales;

pub use mkscales_core::{
    Checksum, CommandRegistry, DeviceProfile, Emulator, FrameCodec, LengthWidth, Opcode,
};
pub use mkscales_transport::{ConnectionHandler, ConnectionState, TcpServer};
pub use mkscales_types::{DeviceIdentity, DivisionCode, WeightReading};
