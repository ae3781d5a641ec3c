use std::fmt::Write as _;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Filler byte sent while the device is busy or the line is idle.
pub const BUSY_BYTE: u8 = 0xB5;

/// End-of-frame marker.
pub const EOF_MARKER: u8 = 0xC0;

/// Length bytes at or above this value are never a frame start.
pub const MAX_MSG_LENGTH: u8 = 0x30;

/// Bytes on the wire beyond the declared length: the length byte itself and the end marker.
pub const FRAME_OVERHEAD: usize = 2;

/// Largest frame the reader will ever assemble.
pub const MAX_FRAME_SIZE: usize = MAX_MSG_LENGTH as usize + FRAME_OVERHEAD;

/// Largest payload (after the type byte) that [`encode_frame`] accepts.
pub const MAX_PAYLOAD: usize = MAX_MSG_LENGTH as usize - 3;

/// Idle gap after which a reception is flagged as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(50);

/// Whether `byte` can start a frame under the given length limit.
pub fn is_length_candidate(byte: u8, max_msg_length: u8) -> bool {
    byte != 0 && byte != BUSY_BYTE && byte < max_msg_length
}

/// Additive checksum, modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Space-separated uppercase hex, as logged for rejected frames.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02X}");
    }
    out
}

/// A validated frame, including its length byte, checksum and end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    raw: Bytes,
}

impl Frame {
    /// Validate a complete wire buffer (length byte through end marker).
    ///
    /// Checks, in order: length range, buffer size, end marker, checksum.
    pub fn validate(raw: impl Into<Bytes>) -> Result<Self> {
        Self::validate_with_max(raw, MAX_MSG_LENGTH)
    }

    pub(crate) fn validate_with_max(raw: impl Into<Bytes>, max_msg_length: u8) -> Result<Self> {
        let raw = raw.into();
        let length = raw.first().copied().unwrap_or(0);
        if !is_length_candidate(length, max_msg_length) {
            return Err(FrameError::LengthOutOfRange {
                length,
                max: max_msg_length,
            });
        }

        let length = usize::from(length);
        let expected = length + FRAME_OVERHEAD;
        if raw.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                actual: raw.len(),
            });
        }

        let eof = raw[length + 1];
        if eof != EOF_MARKER {
            return Err(FrameError::BadEof { found: eof });
        }

        let computed = checksum(&raw[1..length]);
        if computed != raw[length] {
            return Err(FrameError::BadChecksum {
                computed,
                expected: raw[length],
            });
        }

        Ok(Self { raw })
    }

    /// The declared length byte.
    pub fn declared_len(&self) -> usize {
        usize::from(self.raw[0])
    }

    /// Message type identifier (offset 1).
    pub fn message_type(&self) -> u8 {
        self.raw[1]
    }

    /// Message fields: offsets `[2, length)`, between the type byte and the checksum.
    pub fn payload(&self) -> &[u8] {
        self.raw.get(2..self.declared_len()).unwrap_or(&[])
    }

    /// Big-endian `u16` at frame offset `offset`, if it lies before the checksum.
    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.checked(offset, 2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Big-endian `u32` at frame offset `offset`, if it lies before the checksum.
    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.checked(offset, 4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// The full wire buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Total bytes this frame occupied on the wire.
    pub fn wire_size(&self) -> usize {
        self.raw.len()
    }

    fn checked(&self, offset: usize, width: usize) -> Option<&[u8]> {
        let end = offset.checked_add(width)?;
        if offset < 2 || end > self.declared_len() {
            return None;
        }
        self.raw.get(offset..end)
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────────────┬──────────┬──────────┐
/// │ Length   │ Type     │ Payload          │ Checksum │ EOF      │
/// │ (1B) P+2 │ (1B)     │ (P bytes, BE)    │ (1B)     │ 0xC0     │
/// └──────────┴──────────┴──────────────────┴──────────┴──────────┘
/// ```
///
/// The checksum covers the type byte and the payload.
pub fn encode_frame(msg_type: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let length = (payload.len() + 2) as u8;
    let sum = checksum(payload).wrapping_add(msg_type);

    dst.reserve(usize::from(length) + FRAME_OVERHEAD);
    dst.put_u8(length);
    dst.put_u8(msg_type);
    dst.put_slice(payload);
    dst.put_u8(sum);
    dst.put_u8(EOF_MARKER);
    Ok(())
}

/// Configuration for the frame reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Length bytes at or above this value are dropped as noise. Default: `0x30`.
    pub max_msg_length: u8,
    /// Idle gap after which a reception is flagged as stale. Default: 50 ms.
    pub stale_after: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_msg_length: MAX_MSG_LENGTH,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}
