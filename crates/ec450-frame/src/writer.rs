use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, Frame, BUSY_BYTE, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};

/// Writes EC450 frames to any `Write` stream.
///
/// Used to produce synthetic captures and to drive loopback tests; the device
/// itself never receives frames.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Write an already validated frame verbatim.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_all(frame.as_bytes())
    }

    /// Encode and send a message.
    pub fn send(&mut self, msg_type: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(msg_type, payload, &mut self.buf)?;
        let encoded = self.buf.split();
        self.write_all(&encoded)
    }

    /// Write bytes verbatim, bypassing encoding. Used for deliberately damaged frames.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)
    }

    /// Send `count` busy filler bytes.
    pub fn send_filler(&mut self, count: usize) -> Result<()> {
        self.write_all(&vec![BUSY_BYTE; count])
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }
}
