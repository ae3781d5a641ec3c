//! EC450 frame extraction.
//!
//! The meter emits variable-length frames with no start marker other than the
//! length byte itself:
//! - 1-byte length `L`; the whole frame is `L + 2` bytes
//! - message type at offset 1, big-endian fields from offset 2
//! - additive checksum of offsets `[1, L)` at offset `L`
//! - `0xC0` end marker at offset `L + 1`
//!
//! Idle lines carry `0xB5` filler bytes. [`FrameReader`] skips filler and noise,
//! drops corrupt frames and hands out validated [`Frame`]s without ever blocking.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    checksum, encode_frame, hex_dump, is_length_candidate, Frame, FrameConfig, BUSY_BYTE,
    DEFAULT_STALE_AFTER, EOF_MARKER, FRAME_OVERHEAD, MAX_FRAME_SIZE, MAX_MSG_LENGTH, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, ReaderStats};
pub use writer::FrameWriter;
