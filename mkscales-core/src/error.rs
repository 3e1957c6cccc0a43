//! Error types for mkscales-core



/// Result type alias for mkscales operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// First three bytes are not the frame header
    #[error("Invalid header: expected F855CE, received {received}")]
    InvalidHeader {
        /// Hex dump of the received header bytes
        received: String,
    },

    /// Trailing checksum does not match the body
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    InvalidChecksum {
        expected: u16,
        received: u16,
    },

    /// Declared length runs past the end of the buffer
    #[error("Truncated frame: expected {expected} bytes, got {actual} bytes")]
    TruncatedFrame {
        expected: usize,
        actual: usize,
    },

    /// No handler registered for the opcode
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Request body carries no opcode
    #[error("Empty request body")]
    EmptyBody,

    /// Payload does not fit the length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Reply payload could not be decoded
    #[error("Payload error: {0}")]
    Types(#[from] mkscales_types::Error),
}

impl Error {
    /// Check if the error was caused by a malformed or unsupported request
    ///
    /// These abort the current connection only; the client is expected to resend.
    pub fn is_malformed_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidHeader { .. }
                | Self::InvalidChecksum { .. }
                | Self::TruncatedFrame { .. }
                | Self::UnknownOpcode(_)
                | Self::EmptyBody
        )
    }
}
