//! Frame encoding/decoding.
//!
//! Command frames (host → device) are always 18 bytes:
//!
//! ```text
//! +------+------+------+--------+-----------------+-----+
//! | 0xFF | 0xFE | 0x10 | opcode | payload[0..13]  | LRC |
//! +------+------+------+--------+-----------------+-----+
//! ```
//!
//! Response frames (device → host) are 10 or 28 bytes depending on the
//! command, with the status byte in place of the opcode:
//!
//! ```text
//! +------+------+------+--------+-----------------------+-----+
//! | 0xFF | 0xFE | 0x10 | status | payload (zero padded) | LRC |
//! +------+------+------+--------+-----------------------+-----+
//! ```
//!
//! The LRC covers every byte after the two header bytes.

use bytes::BufMut;

use crate::commands::FrameVariant;
use crate::constants::*;
use crate::error::ProtocolError;
use crate::result::ResultCode;

/// Longitudinal redundancy check: `(4096 - sum(bytes)) mod 256`.
///
/// Callers pass the frame without its two header bytes.
pub fn lrc(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}

/// Checksum for a full frame body (header included, LRC byte excluded).
fn frame_lrc(body: &[u8]) -> u8 {
    lrc(body.get(LRC_SKIP..).unwrap_or(&[]))
}

/// Fixed-size command payload.
///
/// Multi-byte fields are little-endian, so a short value occupies the start
/// of its field and the rest stays zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Payload([u8; COMMAND_PAYLOAD_SIZE]);

impl Payload {
    /// All-zero payload.
    pub fn new() -> Self {
        Payload([0u8; COMMAND_PAYLOAD_SIZE])
    }

    /// Build from a slice, zero-padding at the end.
    pub fn from_slice(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() > COMMAND_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLong {
                max: COMMAND_PAYLOAD_SIZE,
                actual: data.len(),
            });
        }
        let mut bytes = [0u8; COMMAND_PAYLOAD_SIZE];
        bytes[..data.len()].copy_from_slice(data);
        Ok(Payload(bytes))
    }

    /// Set a single byte.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not below 13.
    pub fn with_u8(mut self, offset: usize, value: u8) -> Self {
        self.0[offset] = value;
        self
    }

    /// Write a little-endian u32 starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds 13.
    pub fn with_u32_le(mut self, offset: usize, value: u32) -> Self {
        self.0[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; COMMAND_PAYLOAD_SIZE] {
        &self.0
    }
}

/// Encode a command frame.
pub fn encode_frame(opcode: u8, payload: &Payload) -> [u8; COMMAND_FRAME_SIZE] {
    let mut buf = Vec::with_capacity(COMMAND_FRAME_SIZE);
    buf.put_u8(FRAME_HEADER_0);
    buf.put_u8(FRAME_HEADER_1);
    buf.put_u8(FRAME_LEN_BYTE);
    buf.put_u8(opcode);
    buf.put_slice(payload.as_bytes());
    buf.put_u8(frame_lrc(&buf));

    let mut frame = [0u8; COMMAND_FRAME_SIZE];
    frame.copy_from_slice(&buf);
    log::trace!("encoded frame: {}", hex::encode(frame));
    frame
}

/// Encode a command frame from a raw payload slice of at most 13 bytes.
pub fn encode_frame_from_slice(
    opcode: u8,
    payload: &[u8],
) -> Result<[u8; COMMAND_FRAME_SIZE], ProtocolError> {
    Ok(encode_frame(opcode, &Payload::from_slice(payload)?))
}

/// Encode a response frame as the device would send it.
pub fn encode_response(
    status: u8,
    payload: &[u8],
    variant: FrameVariant,
) -> Result<Vec<u8>, ProtocolError> {
    let capacity = variant.payload_capacity();
    if payload.len() > capacity {
        return Err(ProtocolError::PayloadTooLong {
            max: capacity,
            actual: payload.len(),
        });
    }

    let mut buf = Vec::with_capacity(variant.total_len());
    buf.put_u8(FRAME_HEADER_0);
    buf.put_u8(FRAME_HEADER_1);
    buf.put_u8(FRAME_LEN_BYTE);
    buf.put_u8(status);
    buf.put_slice(payload);
    buf.put_bytes(0, capacity - payload.len());
    buf.put_u8(frame_lrc(&buf));
    Ok(buf)
}

/// Result of interpreting one response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Outcome of the exchange.
    pub code: ResultCode,
    /// Status / echoed opcode byte. `None` when the frame was unusable.
    pub status: Option<u8>,
    /// Response payload, `response_len` bytes long when present.
    pub payload: Vec<u8>,
}

impl DecodedFrame {
    /// Frame that carries only a result code.
    pub fn failed(code: ResultCode) -> Self {
        DecodedFrame {
            code,
            status: None,
            payload: Vec::new(),
        }
    }
}

/// Validate and decode a response frame.
///
/// Checks run in a fixed order: length, checksum, device checksum
/// rejection, generic error. A short read is reported as a timeout. The
/// payload is still returned for a generic error since some commands give
/// `0xFF` a specific meaning.
pub fn decode_frame(raw: &[u8], expected_len: usize, payload_len: usize) -> DecodedFrame {
    if raw.len() != expected_len || raw.len() <= PAYLOAD_OFFSET {
        log::trace!(
            "short response: expected {} bytes, got {}",
            expected_len,
            raw.len()
        );
        return DecodedFrame::failed(ResultCode::ErrorTimeout);
    }

    let (body, checksum) = raw.split_at(raw.len() - 1);
    let expected = frame_lrc(body);
    if checksum[0] != expected {
        log::trace!(
            "checksum mismatch: frame {}, expected 0x{:02X}",
            hex::encode(raw),
            expected
        );
        return DecodedFrame::failed(ResultCode::ErrorReceiveChecksum);
    }

    let status = raw[OPCODE_OFFSET];
    if status == PLO_RET_ERROR_LRC {
        return DecodedFrame::failed(ResultCode::ErrorSendChecksum);
    }

    let end = (PAYLOAD_OFFSET + payload_len).min(body.len());
    let payload = raw[PAYLOAD_OFFSET..end].to_vec();
    let code = if status == PLO_RET_ERROR {
        ResultCode::Error
    } else {
        ResultCode::Success
    };

    DecodedFrame {
        code,
        status: Some(status),
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ProtocolRevision;

    #[test]
    fn test_lrc_formula() {
        let samples: [&[u8]; 4] = [&[], &[0x10], &[0x10, 0x01, 0xA0, 0x86, 0x01], &[0xFF; 40]];
        for seq in samples {
            let sum: u32 = seq.iter().map(|&b| b as u32).sum();
            let expected = (4096i64 - sum as i64).rem_euclid(256) as u8;
            assert_eq!(lrc(seq), expected);
        }
    }

    #[test]
    fn test_encode_set_frequency() {
        let payload = Payload::new().with_u32_le(0, 100_000);
        let frame = encode_frame(CMD_SET_FREQ, &payload);

        // 0x10 + 0x01 + 0xA0 + 0x86 + 0x01 = 312, (4096 - 312) % 256 = 0xC8
        let expected = [
            0xFF, 0xFE, 0x10, 0x01, 0xA0, 0x86, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0xC8,
        ];
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_short_payload_is_padded_at_end() {
        let frame = encode_frame_from_slice(CMD_GET_NTH_FREQ, &[3]).unwrap();
        assert_eq!(frame[4], 3);
        assert!(frame[5..17].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_payload_setters() {
        let payload = Payload::new()
            .with_u32_le(COMMAND_PAYLOAD_SIZE - 4, 0x0403_0201)
            .with_u8(0, 7);
        let bytes = payload.as_bytes();
        assert_eq!(bytes[0], 7);
        assert_eq!(&bytes[9..], &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic]
    fn test_u32_past_end_panics() {
        let _ = Payload::new().with_u32_le(COMMAND_PAYLOAD_SIZE - 3, 1);
    }

    #[test]
    #[should_panic]
    fn test_u8_past_end_panics() {
        let _ = Payload::new().with_u8(COMMAND_PAYLOAD_SIZE, 1);
    }

    #[test]
    fn test_payload_too_long() {
        let err = Payload::from_slice(&[0u8; 14]).unwrap_err();
        assert_eq!(err, ProtocolError::PayloadTooLong { max: 13, actual: 14 });
    }

    #[test]
    fn test_command_frame_round_trip() {
        let data: Vec<u8> = (1..=13).collect();
        let payload = Payload::from_slice(&data).unwrap();
        for d in ProtocolRevision::Extended.descriptors() {
            let frame = encode_frame(d.opcode, &payload);
            let decoded = decode_frame(&frame, COMMAND_FRAME_SIZE, COMMAND_PAYLOAD_SIZE);
            assert_eq!(decoded.code, ResultCode::Success);
            assert_eq!(decoded.status, Some(d.opcode));
            assert_eq!(decoded.payload, data);
        }
    }

    #[test]
    fn test_decode_short_read_is_timeout() {
        let frame = encode_response(CMD_GET_DIP_SW, &[5], FrameVariant::Standard).unwrap();
        let decoded = decode_frame(&frame[..9], 10, 1);
        assert_eq!(decoded, DecodedFrame::failed(ResultCode::ErrorTimeout));

        let decoded = decode_frame(&[], 10, 1);
        assert_eq!(decoded.code, ResultCode::ErrorTimeout);
    }

    #[test]
    fn test_decode_bad_checksum() {
        let mut frame = encode_response(CMD_GET_DIP_SW, &[5], FrameVariant::Standard).unwrap();
        frame[9] ^= 0x01;
        assert_eq!(decode_frame(&frame, 10, 1).code, ResultCode::ErrorReceiveChecksum);
    }

    #[test]
    fn test_checksum_checked_before_status() {
        let mut frame = encode_response(PLO_RET_ERROR_LRC, &[], FrameVariant::Standard).unwrap();
        assert_eq!(decode_frame(&frame, 10, 0).code, ResultCode::ErrorSendChecksum);

        frame[9] = frame[9].wrapping_add(1);
        assert_eq!(decode_frame(&frame, 10, 0).code, ResultCode::ErrorReceiveChecksum);
    }

    #[test]
    fn test_generic_error_keeps_payload() {
        let frame = [0xFF, 0xFE, 0x10, 0xFF, 0, 0, 0, 0, 0, 0xF1];
        let decoded = decode_frame(&frame, 10, 4);
        assert_eq!(decoded.code, ResultCode::Error);
        assert_eq!(decoded.status, Some(0xFF));
        assert_eq!(decoded.payload, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_large_response() {
        let sn = b"PLO-0123456789-ABCDEFGH";
        let frame = encode_response(CMD_GET_SN, sn, FrameVariant::Large).unwrap();
        assert_eq!(frame.len(), 28);
        let decoded = decode_frame(&frame, 28, 23);
        assert_eq!(decoded.code, ResultCode::Success);
        assert_eq!(decoded.payload, sn.to_vec());
    }

    #[test]
    fn test_response_payload_too_long() {
        let err = encode_response(0, &[0u8; 6], FrameVariant::Standard).unwrap_err();
        assert_eq!(err, ProtocolError::PayloadTooLong { max: 5, actual: 6 });

        let err = encode_response(0, &[0u8; 24], FrameVariant::Large).unwrap_err();
        assert_eq!(err, ProtocolError::PayloadTooLong { max: 23, actual: 24 });
    }

    #[test]
    fn test_response_fills_exact_frame() {
        for variant in [FrameVariant::Standard, FrameVariant::Large] {
            let empty = encode_response(CMD_RESP, &[], variant).unwrap();
            assert_eq!(empty.len(), variant.total_len());

            let full = vec![0xA5; variant.payload_capacity()];
            let frame = encode_response(CMD_GET_ID, &full, variant).unwrap();
            assert_eq!(frame.len(), variant.total_len());
            let decoded = decode_frame(&frame, variant.total_len(), full.len());
            assert_eq!(decoded.code, ResultCode::Success);
            assert_eq!(decoded.payload, full);
        }

        // Empty standard reply to set-frequency
        assert_eq!(
            encode_response(CMD_SET_FREQ, &[], FrameVariant::Standard).unwrap(),
            vec![0xFF, 0xFE, 0x10, 0x01, 0, 0, 0, 0, 0, 0xEF]
        );
    }
}
