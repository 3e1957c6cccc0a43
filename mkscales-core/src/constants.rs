//! Protocol constants

/// Frame header shared by requests and responses
pub const FRAME_HEADER: [u8; 3] = [0xF8, 0x55, 0xCE];

/// Header size in bytes
pub const HEADER_SIZE: usize = FRAME_HEADER.len();

/// Trailing checksum size in bytes
pub const CHECKSUM_SIZE: usize = 2;

/// CRC polynomial
pub const CRC_POLYNOMIAL: u16 = 0x1021;

/// Initial CRC value used by the device
pub const CRC_INIT: u16 = 0x0000;

/// Initial CRC value matching the legacy test client (CRC-16/AUG-CCITT)
pub const CRC_INIT_AUG_CCITT: u16 = 0x1D0F;

/// Maximum bytes taken from the socket for a single request
pub const DEFAULT_READ_LIMIT: usize = 100;

/// Default listen address
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

/// Request opcodes (first body byte)
pub mod opcodes {
    /// Read the current weight
    pub const GET_WEIGHT: u8 = 0xA0;

    /// Read the device serial number
    pub const GET_DEVICE_ID: u8 = 0x90;
}
