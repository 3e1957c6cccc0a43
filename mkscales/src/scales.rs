//! High-level scales client

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, trace};

use mkscales_core::{FrameCodec, Opcode};
use mkscales_transport::{TcpTransport, Transport};
use mkscales_types::{DeviceIdentity, WeightReading};

use crate::error::Result;

/// MK scales client
///
/// The device serves a single request per connection, so every command
/// opens a fresh connection.
///
/// # Examples
///
/// ```no_run
/// use mkscales::Scales;
///
/// #[tokio::main]
/// async fn main() -> mkscales::Result<()> {
///     let scales = Scales::new("127.0.0.1", 8000);
///
///     let id = scales.get_device_id().await?;
///     let reading = scales.get_weight().await?;
///     println!("{}: {}", id, reading);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Scales {
    host: String,
    port: u16,
    timeout: Duration,
    codec: FrameCodec,
}

impl Scales {
    /// Create a client for the device at `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(2),
            codec: FrameCodec::new(),
        }
    }

    /// Set connect and response timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom frame codec (e.g. a different checksum seed)
    pub fn with_codec(mut self, codec: FrameCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Read the current weight
    pub async fn get_weight(&self) -> Result<WeightReading> {
        let payload = self.execute(Opcode::GetWeight).await?;
        let reading = WeightReading::from_payload(&payload)?;

        debug!("Weight: {}", reading);

        Ok(reading)
    }

    /// Read the device serial number
    pub async fn get_device_id(&self) -> Result<DeviceIdentity> {
        let payload = self.execute(Opcode::GetDeviceId).await?;
        let identity = DeviceIdentity::from_payload(&payload)?;

        debug!("Identity: {}", identity);

        Ok(identity)
    }

    /// Send one raw request body and return the response payload
    pub async fn request(&self, body: &[u8]) -> Result<Bytes> {
        let frame = self.codec.encode_request(body)?;

        let mut transport = TcpTransport::new(self.host.clone(), self.port)
            .with_connect_timeout(self.timeout);
        transport.connect().await?;

        let exchange = match transport.send(&frame).await {
            Ok(()) => transport.receive(self.timeout).await,
            Err(e) => Err(e),
        };

        transport.disconnect().await?;

        let raw = exchange?;
        let payload = self.codec.parse_response(&raw)?;

        trace!("Response payload: {:02X?}", &payload[..]);

        Ok(payload)
    }

    async fn execute(&self, opcode: Opcode) -> Result<Bytes> {
        debug!("Sending {} to {}:{}", opcode, self.host, self.port);
        self.request(&[u8::from(opcode)]).await
    }
}
