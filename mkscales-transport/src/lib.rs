//! Transport layer for the MK scales protocol
//!
//! Server side: a TCP listener that hands each connection to a
//! [`ConnectionHandler`]. Client side: a [`Transport`] for talking to a
//! device or emulator.

pub mod connection;
pub mod error;
pub mod server;
pub mod tcp;

pub use connection::{ConnectionHandler, ConnectionState};
pub use error::{Error, Result};
pub use server::TcpServer;
pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Client transport trait
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to device
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from device
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive one raw response (with timeout)
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}
