//! MK scales checksum algorithm
//!
//! Bit-by-bit CRC over the frame body:
//! 1. Start from the initial value (0 on the device)
//! 2. For each byte, eight times: test the top bit of `byte ^ (crc >> 8)`,
//!    shift `crc` left, XOR in polynomial 0x1021 when the bit was set,
//!    then shift the byte left
//! 3. Keep both values masked to their widths after every step
//!
//! The checksum travels on the wire as 2 bytes, big-endian.

use tracing::trace;

use crate::constants::{CRC_INIT, CRC_POLYNOMIAL};

/// Checksum engine
///
/// Carries the initial CRC value. The device uses 0
/// ([`Checksum::default`]); other values exist for interoperating with
/// clients that seed the register differently.
///
/// # Examples
///
/// ```
/// use mkscales_core::checksum::Checksum;
///
/// let engine = Checksum::default();
/// assert_eq!(engine.compute(&[0x90]), 0x83B9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum {
    init: u16,
}

impl Checksum {
    /// Create an engine with a custom initial value
    pub const fn new(init: u16) -> Self {
        Self { init }
    }

    /// Initial CRC value
    pub const fn init(&self) -> u16 {
        self.init
    }

    /// Calculate the checksum of `data`
    pub fn compute(&self, data: &[u8]) -> u16 {
        let mut crc = self.init;

        for &byte in data {
            let mut b = byte;
            for _ in 0..8 {
                let bit = (b ^ (crc >> 8) as u8) & 0x80;
                crc <<= 1;
                if bit != 0 {
                    crc ^= CRC_POLYNOMIAL;
                }
                b <<= 1;
            }
        }

        trace!(
            init = format!("0x{:04X}", self.init),
            data_len = data.len(),
            checksum = format!("0x{:04X}", crc),
            "Calculated checksum"
        );

        crc
    }

    /// Verify `data` against an expected checksum
    pub fn verify(&self, data: &[u8], expected: u16) -> bool {
        self.compute(data) == expected
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new(CRC_INIT)
    }
}

/// Calculate the device checksum (initial value 0)
///
/// # Examples
///
/// ```
/// use mkscales_core::checksum;
///
/// let crc = checksum::calculate(b"\x50\x31\x32\x33\x34");
/// assert_eq!(crc, 0xC2BB);
/// ```
pub fn calculate(data: &[u8]) -> u16 {
    Checksum::default().compute(data)
}

/// Verify checksum
pub fn verify(data: &[u8], expected: u16) -> bool {
    calculate(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CRC_INIT_AUG_CCITT;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(calculate(&[]), 0x0000);
    }

    #[test]
    fn test_checksum_known_vectors() {
        assert_eq!(calculate(&[0x90]), 0x83B9);
        assert_eq!(calculate(&[0xA0]), 0xB5EA);
        assert_eq!(calculate(&[0x50, 0x31, 0x32, 0x33, 0x34]), 0xC2BB);
        assert_eq!(calculate(&[0x10, 0x00, 0x00, 0x00, 0x00, 0x03]), 0x2AE7);
    }

    #[test]
    fn test_checksum_matches_xmodem_check_value() {
        // Zero-initialised CCITT polynomial, no reflection: CRC-16/XMODEM
        assert_eq!(calculate(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_checksum_aug_ccitt_init() {
        let engine = Checksum::new(CRC_INIT_AUG_CCITT);
        assert_eq!(engine.compute(&[0x90]), 0x4F25);
        assert_ne!(engine.compute(&[0x90]), calculate(&[0x90]));
    }

    #[test]
    fn test_checksum_verify() {
        let payload: [u8; 2] = [0xAB, 0xCD];
        let crc = calculate(&payload);

        assert!(verify(&payload, crc));
        assert!(!verify(&payload, crc.wrapping_add(1)));
    }

    #[test]
    fn test_checksum_large_payload() {
        let payload = vec![0xFF; 1000];
        assert_eq!(calculate(&payload), calculate(&payload));
    }

    proptest! {
        #[test]
        fn prop_checksum_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(calculate(&data), calculate(&data.clone()));
        }

        #[test]
        fn prop_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut flipped = data.clone();
            let i = index.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert_ne!(calculate(&data), calculate(&flipped));
        }
    }
}
