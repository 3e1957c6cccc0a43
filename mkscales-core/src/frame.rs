//! MK scales frame structure and encoding/decoding

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{
    checksum::Checksum,
    constants::{CHECKSUM_SIZE, FRAME_HEADER, HEADER_SIZE},
    error::{Error, Result},
};

/// Width of the length field that follows the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthWidth {
    /// Single byte, payloads up to 255 bytes
    One,
    /// Two bytes big-endian, payloads up to 65535 bytes
    Two,
}

impl LengthWidth {
    /// Field size in bytes
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Largest length the field can express
    pub const fn max_len(self) -> usize {
        match self {
            Self::One => u8::MAX as usize,
            Self::Two => u16::MAX as usize,
        }
    }
}

impl TryFrom<u8> for LengthWidth {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(other),
        }
    }
}

impl fmt::Display for LengthWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.bytes())
    }
}

/// MK scales frame codec
///
/// # Frame Structure
///
/// ```text
/// ┌─────────────┬─────────────┬─────────────┬─────────────┐
/// │   Header    │   Length    │    Body     │  Checksum   │
/// │  F8 55 CE   │  1|2 bytes  │   N bytes   │   2 bytes   │
/// │             │   (BE)      │             │  (BE u16)   │
/// └─────────────┴─────────────┴─────────────┴─────────────┘
/// ```
///
/// Requests carry a 2-byte length, responses a 1-byte length. Both widths
/// are configurable; the defaults match deployed clients.
///
/// # Examples
///
/// ```
/// use mkscales_core::FrameCodec;
///
/// let codec = FrameCodec::new();
/// let request = codec.encode_request(&[0x90]).unwrap();
/// assert_eq!(&request[..], &[0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x83, 0xB9]);
///
/// let body = codec.parse(&request).unwrap();
/// assert_eq!(&body[..], &[0x90]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    request_width: LengthWidth,
    response_width: LengthWidth,
    checksum: Checksum,
}

impl FrameCodec {
    /// Length width of inbound requests
    pub const DEFAULT_REQUEST_WIDTH: LengthWidth = LengthWidth::Two;

    /// Length width of outbound responses
    pub const DEFAULT_RESPONSE_WIDTH: LengthWidth = LengthWidth::One;

    /// Create a codec with device defaults
    pub fn new() -> Self {
        Self {
            request_width: Self::DEFAULT_REQUEST_WIDTH,
            response_width: Self::DEFAULT_RESPONSE_WIDTH,
            checksum: Checksum::default(),
        }
    }

    /// Set the request length width
    pub fn with_request_width(mut self, width: LengthWidth) -> Self {
        self.request_width = width;
        self
    }

    /// Set the response length width
    pub fn with_response_width(mut self, width: LengthWidth) -> Self {
        self.response_width = width;
        self
    }

    /// Set the checksum engine
    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn request_width(&self) -> LengthWidth {
        self.request_width
    }

    pub fn response_width(&self) -> LengthWidth {
        self.response_width
    }

    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// Parse an inbound request and return its body
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHeader`] if the buffer does not start with `F8 55 CE`
    /// - [`Error::TruncatedFrame`] if the declared length runs past the buffer
    /// - [`Error::InvalidChecksum`] if the trailing checksum does not match
    pub fn parse(&self, raw: &[u8]) -> Result<Bytes> {
        self.decode(raw, self.request_width)
    }

    /// Build an outbound response around `payload`
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload length does not fit
    /// the response length field.
    pub fn build(&self, payload: &[u8]) -> Result<BytesMut> {
        self.encode(payload, self.response_width)
    }

    /// Build a request-shaped frame around `body`
    pub fn encode_request(&self, body: &[u8]) -> Result<BytesMut> {
        self.encode(body, self.request_width)
    }

    /// Parse a response-shaped frame and return its payload
    pub fn parse_response(&self, raw: &[u8]) -> Result<Bytes> {
        self.decode(raw, self.response_width)
    }

    fn encode(&self, payload: &[u8], width: LengthWidth) -> Result<BytesMut> {
        if payload.len() > width.max_len() {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: width.max_len(),
            });
        }

        let total_size = HEADER_SIZE + width.bytes() + payload.len() + CHECKSUM_SIZE;
        let mut buf = BytesMut::with_capacity(total_size);

        buf.put_slice(&FRAME_HEADER);
        match width {
            LengthWidth::One => buf.put_u8(payload.len() as u8),
            LengthWidth::Two => buf.put_u16(payload.len() as u16),
        }
        buf.put_slice(payload);
        buf.put_u16(self.checksum.compute(payload));

        trace!(len = buf.len(), frame = %hex::encode(&buf), "Encoded frame");

        Ok(buf)
    }

    fn decode(&self, raw: &[u8], width: LengthWidth) -> Result<Bytes> {
        let header_len = raw.len().min(HEADER_SIZE);
        if raw.is_empty() || raw[..header_len] != FRAME_HEADER[..header_len] {
            return Err(Error::InvalidHeader {
                received: hex::encode(&raw[..header_len]),
            });
        }

        let body_start = HEADER_SIZE + width.bytes();
        if raw.len() < body_start {
            return Err(Error::TruncatedFrame {
                expected: body_start,
                actual: raw.len(),
            });
        }

        let body_len = BigEndian::read_uint(&raw[HEADER_SIZE..body_start], width.bytes()) as usize;
        let body_end = body_start + body_len;
        let frame_end = body_end + CHECKSUM_SIZE;

        if raw.len() < frame_end {
            return Err(Error::TruncatedFrame {
                expected: frame_end,
                actual: raw.len(),
            });
        }

        let body = &raw[body_start..body_end];
        let received = BigEndian::read_u16(&raw[body_end..frame_end]);
        let expected = self.checksum.compute(body);

        if expected != received {
            return Err(Error::InvalidChecksum { expected, received });
        }

        trace!(len = body_len, body = %hex::encode(body), "Decoded frame");

        Ok(Bytes::copy_from_slice(body))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CRC_INIT_AUG_CCITT;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_build_get_id_response() {
        let codec = FrameCodec::new();
        let frame = codec.build(&[0x50, 0x31, 0x32, 0x33, 0x34]).unwrap();

        assert_eq!(
            &frame[..],
            &[0xF8, 0x55, 0xCE, 0x05, 0x50, 0x31, 0x32, 0x33, 0x34, 0xC2, 0xBB]
        );
    }

    #[test]
    fn test_build_empty_payload() {
        let frame = FrameCodec::new().build(&[]).unwrap();
        assert_eq!(&frame[..], &[0xF8, 0x55, 0xCE, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_build_payload_too_large() {
        let result = FrameCodec::new().build(&[0u8; 256]);
        assert!(matches!(
            result,
            Err(Error::PayloadTooLarge { size: 256, max: 255 })
        ));
    }

    #[test]
    fn test_build_two_byte_response_width() {
        let codec = FrameCodec::new().with_response_width(LengthWidth::Two);
        let frame = codec.build(&[0u8; 256]).unwrap();

        assert_eq!(&frame[3..5], &[0x01, 0x00]);
        assert_eq!(frame.len(), 3 + 2 + 256 + 2);
    }

    #[test]
    fn test_parse_get_id_request() {
        let raw = [0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x83, 0xB9];
        let body = FrameCodec::new().parse(&raw).unwrap();
        assert_eq!(&body[..], &[0x90]);
    }

    #[test]
    fn test_parse_legacy_client_request() {
        let raw = [0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x4F, 0x25];

        let result = FrameCodec::new().parse(&raw);
        assert!(matches!(
            result,
            Err(Error::InvalidChecksum { expected: 0x83B9, received: 0x4F25 })
        ));

        let legacy = FrameCodec::new().with_checksum(Checksum::new(CRC_INIT_AUG_CCITT));
        assert_eq!(&legacy.parse(&raw).unwrap()[..], &[0x90]);
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let raw = [0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x83, 0xB9, 0xDE, 0xAD];
        let body = FrameCodec::new().parse(&raw).unwrap();
        assert_eq!(&body[..], &[0x90]);
    }

    #[test]
    fn test_parse_invalid_header() {
        let raw = [0xF8, 0x55, 0xCF, 0x00, 0x01, 0x90, 0x83, 0xB9];
        let result = FrameCodec::new().parse(&raw);

        match result {
            Err(Error::InvalidHeader { received }) => assert_eq!(received, "f855cf"),
            other => panic!("Expected InvalidHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_short_buffers() {
        let codec = FrameCodec::new();

        assert!(matches!(codec.parse(&[]), Err(Error::InvalidHeader { .. })));
        assert!(matches!(codec.parse(&[0x00, 0x55]), Err(Error::InvalidHeader { .. })));
        assert!(matches!(
            codec.parse(&[0xF8, 0x55]),
            Err(Error::TruncatedFrame { expected: 5, actual: 2 })
        ));
        assert!(matches!(
            codec.parse(&[0xF8, 0x55, 0xCE, 0x00]),
            Err(Error::TruncatedFrame { expected: 5, actual: 4 })
        ));
    }

    #[test]
    fn test_parse_length_exceeds_buffer() {
        // Declares 0x0100 body bytes but carries one
        let raw = [0xF8, 0x55, 0xCE, 0x01, 0x00, 0x90, 0x83, 0xB9];
        let result = FrameCodec::new().parse(&raw);

        assert!(matches!(
            result,
            Err(Error::TruncatedFrame { expected: 263, actual: 8 })
        ));
    }

    #[test]
    fn test_parse_missing_checksum() {
        let raw = [0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x83];
        assert!(matches!(
            FrameCodec::new().parse(&raw),
            Err(Error::TruncatedFrame { expected: 8, actual: 7 })
        ));
    }

    #[test]
    fn test_parse_response_roundtrip() {
        let codec = FrameCodec::new();
        let frame = codec.build(&[0x10, 0, 0, 0, 0, 0x03]).unwrap();
        let payload = codec.parse_response(&frame).unwrap();

        assert_eq!(&payload[..], &[0x10, 0, 0, 0, 0, 0x03]);
    }

    #[test]
    fn test_length_width_try_from() {
        assert_eq!(LengthWidth::try_from(1u8), Ok(LengthWidth::One));
        assert_eq!(LengthWidth::try_from(2u8), Ok(LengthWidth::Two));
        assert_eq!(LengthWidth::try_from(3u8), Err(3));
    }

    proptest! {
        #[test]
        fn prop_request_roundtrip(body in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let codec = FrameCodec::new();
            let frame = codec.encode_request(&body).unwrap();
            prop_assert_eq!(&codec.parse(&frame).unwrap()[..], &body[..]);
        }

        #[test]
        fn prop_bad_header_rejected(
            header in proptest::array::uniform3(any::<u8>()),
            tail in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            prop_assume!(header != FRAME_HEADER);
            let mut raw = header.to_vec();
            raw.extend_from_slice(&tail);
            let is_invalid_header = matches!(
                FrameCodec::new().parse(&raw),
                Err(Error::InvalidHeader { .. })
            );
            prop_assert!(is_invalid_header);
        }

        #[test]
        fn prop_body_bit_flip_rejected(
            body in proptest::collection::vec(any::<u8>(), 1..128),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let codec = FrameCodec::new();
            let mut frame = codec.encode_request(&body).unwrap();
            let i = HEADER_SIZE + 2 + index.index(body.len());
            frame[i] ^= 1 << bit;
            let is_invalid_checksum = matches!(
                codec.parse(&frame),
                Err(Error::InvalidChecksum { .. })
            );
            prop_assert!(is_invalid_checksum);
        }
    }
}
