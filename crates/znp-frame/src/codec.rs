use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::command::{Command, CommandType};
use crate::error::{FrameError, Result};

/// Start-of-frame marker.
pub const SOF: u8 = 0xFE;

/// Frame header: SOF (1) + length (1) + CMD0 (1) + CMD1 (1) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Trailing frame check sequence.
pub const FCS_SIZE: usize = 1;

/// Largest payload the MT protocol allows.
pub const MAX_PAYLOAD: usize = 250;

/// A received or outgoing ZNP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Request, response or indication.
    pub command_type: CommandType,
    /// Subsystem and command id.
    pub command: Command,
    /// Command-specific payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(command_type: CommandType, command: Command, payload: impl Into<Bytes>) -> Self {
        Self {
            command_type,
            command,
            payload: payload.into(),
        }
    }

    /// Whether this frame carries `command` as `command_type`.
    pub fn is(&self, command_type: CommandType, command: Command) -> bool {
        self.command_type == command_type && self.command == command
    }

    /// The total wire size of this frame (header + payload + FCS).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + FCS_SIZE
    }
}

/// XOR of every byte, the MT frame check sequence.
pub fn fcs(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬────────┬────────┬────────┬──────────────┬──────┐
/// │ SOF  │ Length │ CMD0   │ CMD1   │ Payload      │ FCS  │
/// │ 0xFE │ (1B)   │ type | │ cmd id │ (Length B)   │ XOR  │
/// │      │        │ subsys │        │              │      │
/// └──────┴────────┴────────┴────────┴──────────────┴──────┘
/// ```
/// The FCS covers everything between SOF and FCS.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let len = frame.payload.len();
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(frame.wire_size());
    let start = dst.len();
    dst.put_u8(SOF);
    dst.put_u8(len as u8);
    dst.put_u8(frame.command.cmd0(frame.command_type));
    dst.put_u8(frame.command.id);
    dst.put_slice(&frame.payload);
    let checksum = fcs(&dst[start + 1..]);
    dst.put_u8(checksum);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Bytes before the next SOF are discarded. Returns `Ok(None)` if the buffer
/// doesn't contain a complete frame yet.
///
/// A header whose length or checksum doesn't hold up loses only its SOF, so
/// a stray `0xFE` in line noise cannot swallow the frame behind it. A frame
/// with a valid checksum but an unknown CMD0 is consumed whole. Either way the
/// error is returned and decoding can resume with the following bytes.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    match src.iter().position(|&b| b == SOF) {
        Some(0) => {}
        Some(skip) => {
            trace!(skip, "discarding bytes before start of frame");
            src.advance(skip);
        }
        None => {
            if !src.is_empty() {
                trace!(skip = src.len(), "discarding bytes without start of frame");
                src.clear();
            }
            return Ok(None);
        }
    }

    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let payload_len = usize::from(src[1]);
    let max = max_payload.min(MAX_PAYLOAD);
    if payload_len > max {
        // Treat this SOF as noise and resynchronise on the next one.
        src.advance(1);
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max,
        });
    }

    let total = HEADER_SIZE + payload_len + FCS_SIZE;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    let computed = fcs(&src[1..total - 1]);
    let received = src[total - 1];
    if computed != received {
        src.advance(1);
        return Err(FrameError::ChecksumMismatch { computed, received });
    }

    let header = Command::from_header(src[2], src[3]);
    let (command_type, command) = match header {
        Ok(parts) => parts,
        Err(err) => {
            src.advance(total);
            return Err(err);
        }
    };

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    src.advance(FCS_SIZE);

    Ok(Some(Frame {
        command_type,
        command,
        payload,
    }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default and ceiling: 250.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{sys, zdo};

    #[test]
    fn test_encode_known_ping_bytes() {
        let mut buf = BytesMut::new();
        let frame = Frame::new(CommandType::Sreq, sys::PING, Bytes::new());
        encode_frame(&frame, &mut buf).unwrap();

        assert_eq!(buf.as_ref(), &[0xFE, 0x00, 0x21, 0x01, 0x20]);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let frame = Frame::new(CommandType::Areq, zdo::STATE_CHANGE_IND, vec![0x09]);

        encode_frame(&frame, &mut buf).unwrap();
        assert_eq!(buf.len(), frame.wire_size());

        let decoded = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[SOF, 0x02, 0x61][..]);
        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        let frame = Frame::new(CommandType::Srsp, sys::PING, vec![0x59, 0x06]);
        encode_frame(&frame, &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 1);

        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn test_decode_skips_leading_garbage() {
        let mut buf = BytesMut::from(&[0x00, 0x13, 0x37][..]);
        let frame = Frame::new(CommandType::Srsp, sys::PING, vec![0x59, 0x06]);
        encode_frame(&frame, &mut buf).unwrap();

        let decoded = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_checksum_mismatch_resyncs() {
        let mut buf = BytesMut::new();
        let bad = Frame::new(CommandType::Srsp, sys::PING, vec![0x59, 0x06]);
        encode_frame(&bad, &mut buf).unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        let good = Frame::new(CommandType::Areq, zdo::STATE_CHANGE_IND, vec![0x09]);
        encode_frame(&good, &mut buf).unwrap();

        let err = decode_frame(&mut buf, MAX_PAYLOAD).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
        assert!(err.is_recoverable());

        let next = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(next, good);
    }

    #[test]
    fn test_stray_sof_does_not_swallow_next_frame() {
        let mut buf = BytesMut::from(&[SOF, 0x05][..]);
        let ping = Frame::new(CommandType::Srsp, sys::PING, vec![0x59, 0x06]);
        encode_frame(&ping, &mut buf).unwrap();
        buf.extend_from_slice(&[0x00; 4]);

        let err = decode_frame(&mut buf, MAX_PAYLOAD).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
        assert_eq!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap(), ping);
        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn test_decode_payload_too_large_resyncs() {
        let mut buf = BytesMut::from(&[SOF, 0xFF, 0x61, 0x01][..]);
        let err = decode_frame(&mut buf, MAX_PAYLOAD).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 255, .. }));
        assert_eq!(buf.as_ref(), &[0xFF, 0x61, 0x01]);
    }

    #[test]
    fn test_encode_payload_too_large() {
        let frame = Frame::new(CommandType::Sreq, sys::OSAL_NV_WRITE, vec![0u8; 251]);
        let err = encode_frame(&frame, &mut BytesMut::new()).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 251, .. }));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        let first = Frame::new(CommandType::Srsp, sys::PING, vec![0x59, 0x06]);
        let second = Frame::new(CommandType::Areq, sys::RESET_IND, vec![0, 2, 0, 2, 6, 3]);
        encode_frame(&first, &mut buf).unwrap();
        encode_frame(&second, &mut buf).unwrap();

        assert_eq!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap(), first);
        assert_eq!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap(), second);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_only_noise_is_dropped() {
        let mut buf = BytesMut::from(&[0x01, 0x02, 0x03][..]);
        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());
        assert!(buf.is_empty());
    }
}
